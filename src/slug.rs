//! Slug codec: maps URL path segments such as `bak-men-24-b01` to a typed
//! program identity and back, and derives the canonical group key
//! (`24.B01-vshm`) from it.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

use crate::models::Language;

/// Institutional suffix carried by every canonical group key.
pub const GROUP_SUFFIX: &str = "vshm";

const MIN_YEAR: u16 = 2000;
const MAX_YEAR: u16 = 2099;

static GROUP_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]\d{2}$").expect("group code regex compiles"));
static FULL_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})\.([A-Za-z]\d{2})-(?i:vshm)$").expect("full code regex compiles")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlugError {
    #[error("Slug must have 4 hyphen-separated parts, got {0}")]
    SegmentCount(usize),
    #[error("Unknown program: {0}")]
    UnknownProgram(String),
    #[error("Invalid year: {0}")]
    InvalidYear(String),
    #[error("Year {0} is outside 2000-2099")]
    YearOutOfRange(u16),
    #[error("Invalid group code: {0}")]
    InvalidGroupCode(String),
    #[error("Invalid group full code: {0}")]
    InvalidFullCode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Degree {
    Bachelor,
    Master,
}

impl Degree {
    pub const ALL: [Degree; 2] = [Degree::Bachelor, Degree::Master];

    pub fn abbrev(self) -> &'static str {
        match self {
            Degree::Bachelor => "bak",
            Degree::Master => "mag",
        }
    }

    /// Legacy slugs do not always carry an exact degree marker, so anything
    /// other than `mag` reads as a bachelor's degree.
    pub fn from_abbrev(abbrev: &str) -> Self {
        if abbrev.eq_ignore_ascii_case("mag") {
            Degree::Master
        } else {
            Degree::Bachelor
        }
    }

    /// Group letters follow the degree: `b01` is a bachelor group, `m01` a
    /// master group.
    pub fn from_group_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_lowercase() {
            'b' => Some(Degree::Bachelor),
            'm' => Some(Degree::Master),
            _ => None,
        }
    }

    pub fn name(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Degree::Bachelor, Language::En) => "Bachelor's",
            (Degree::Master, Language::En) => "Master's",
            (Degree::Bachelor, Language::Ru) => "Бакалавриат",
            (Degree::Master, Language::Ru) => "Магистратура",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    Management,
    InternationalManagement,
    PublicAdministration,
    BusinessAnalytics,
    SmartCityManagement,
    CorporateFinance,
}

struct ProgramEntry {
    program: Program,
    abbrev: &'static str,
    name_en: &'static str,
    name_ru: &'static str,
}

// Single source for both lookup directions, indexed by `Program` discriminant.
static PROGRAM_TABLE: [ProgramEntry; 6] = [
    ProgramEntry {
        program: Program::Management,
        abbrev: "men",
        name_en: "Management",
        name_ru: "Менеджмент",
    },
    ProgramEntry {
        program: Program::InternationalManagement,
        abbrev: "mmen",
        name_en: "International Management",
        name_ru: "Международный менеджмент",
    },
    ProgramEntry {
        program: Program::PublicAdministration,
        abbrev: "gmu",
        name_en: "Public Administration",
        name_ru: "Государственное и муниципальное управление",
    },
    ProgramEntry {
        program: Program::BusinessAnalytics,
        abbrev: "babd",
        name_en: "Business Analytics and Big Data",
        name_ru: "Бизнес-аналитика и большие данные",
    },
    ProgramEntry {
        program: Program::SmartCityManagement,
        abbrev: "scm",
        name_en: "Smart City Management",
        name_ru: "Управление умным городом",
    },
    ProgramEntry {
        program: Program::CorporateFinance,
        abbrev: "cfin",
        name_en: "Corporate Finance",
        name_ru: "Корпоративные финансы",
    },
];

impl Program {
    pub const ALL: [Program; 6] = [
        Program::Management,
        Program::InternationalManagement,
        Program::PublicAdministration,
        Program::BusinessAnalytics,
        Program::SmartCityManagement,
        Program::CorporateFinance,
    ];

    fn entry(self) -> &'static ProgramEntry {
        &PROGRAM_TABLE[self as usize]
    }

    pub fn abbrev(self) -> &'static str {
        self.entry().abbrev
    }

    pub fn name(self, lang: Language) -> &'static str {
        match lang {
            Language::En => self.entry().name_en,
            Language::Ru => self.entry().name_ru,
        }
    }

    pub fn from_abbrev(abbrev: &str) -> Option<Self> {
        PROGRAM_TABLE
            .iter()
            .find(|entry| entry.abbrev.eq_ignore_ascii_case(abbrev))
            .map(|entry| entry.program)
    }

    /// Looks a program up by its English display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        PROGRAM_TABLE
            .iter()
            .find(|entry| entry.name_en.eq_ignore_ascii_case(name))
            .map(|entry| entry.program)
    }

    /// Maps the legacy group numbering onto programs. Groups outside the
    /// known ranges have no program rather than defaulting to Management.
    pub fn infer_from_group(group: &GroupCode) -> Option<Self> {
        match (Degree::from_group_prefix(group.prefix())?, group.number()) {
            (Degree::Bachelor, 1..=8) => Some(Program::Management),
            (Degree::Bachelor, 9..=10) => Some(Program::PublicAdministration),
            (Degree::Bachelor, 11..=12) => Some(Program::InternationalManagement),
            (Degree::Master, 1) => Some(Program::Management),
            (Degree::Master, 2) => Some(Program::CorporateFinance),
            (Degree::Master, 3) => Some(Program::SmartCityManagement),
            (Degree::Master, 4) => Some(Program::BusinessAnalytics),
            _ => None,
        }
    }
}

/// Group code such as `B01`: one letter followed by two digits, stored
/// uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupCode(String);

impl GroupCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> char {
        self.0.chars().next().unwrap_or('?')
    }

    pub fn number(&self) -> u8 {
        self.0[1..].parse().unwrap_or(0)
    }
}

impl FromStr for GroupCode {
    type Err = SlugError;

    /// Accepts a bare code in any case (`b01`) or a full code
    /// (`24.B01-vshm`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if GROUP_CODE_RE.is_match(raw) {
            return Ok(Self(raw.to_ascii_uppercase()));
        }
        raw.parse::<GroupFullCode>()
            .map(|full| full.group)
            .map_err(|_| SlugError::InvalidGroupCode(raw.to_string()))
    }
}

impl TryFrom<String> for GroupCode {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupCode> for String {
    fn from(value: GroupCode) -> Self {
        value.0
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical storage key for a group, e.g. `24.B01-vshm`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupFullCode {
    year: u16,
    group: GroupCode,
}

impl GroupFullCode {
    pub fn new(year: u16, group: GroupCode) -> Self {
        Self { year, group }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn group(&self) -> &GroupCode {
        &self.group
    }

    /// Russian pages print the group letter and suffix in Cyrillic.
    pub fn localized(&self, lang: Language) -> String {
        let code = self.to_string();
        match lang {
            Language::En => code,
            Language::Ru => code
                .replace('B', "Б")
                .replace('M', "М")
                .replace(GROUP_SUFFIX, "вшм"),
        }
    }
}

impl fmt::Display for GroupFullCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{}-{}", self.year % 100, self.group, GROUP_SUFFIX)
    }
}

impl FromStr for GroupFullCode {
    type Err = SlugError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let caps = FULL_CODE_RE
            .captures(raw.trim())
            .ok_or_else(|| SlugError::InvalidFullCode(raw.to_string()))?;
        let year = expand_year(&caps[1])?;
        Ok(Self {
            year,
            group: GroupCode(caps[2].to_ascii_uppercase()),
        })
    }
}

/// Structured identity behind a timetable address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramIdentity {
    pub degree: Degree,
    pub program: Program,
    pub year: u16,
    pub group: GroupCode,
}

impl ProgramIdentity {
    pub fn new(
        degree: Degree,
        program: Program,
        year: u16,
        group: GroupCode,
    ) -> Result<Self, SlugError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(SlugError::YearOutOfRange(year));
        }
        Ok(Self {
            degree,
            program,
            year,
            group,
        })
    }

    pub fn slug(&self) -> String {
        format!(
            "{}-{}-{:02}-{}",
            self.degree.abbrev(),
            self.program.abbrev(),
            self.year % 100,
            self.group.as_str().to_ascii_lowercase()
        )
    }

    pub fn full_code(&self) -> GroupFullCode {
        GroupFullCode::new(self.year, self.group.clone())
    }

    /// Human-readable heading, e.g. `Bachelor's in Management - 2024 - Group B01`.
    pub fn display_name(&self, lang: Language) -> String {
        match lang {
            Language::En => format!(
                "{} in {} - {} - Group {}",
                self.degree.name(lang),
                self.program.name(lang),
                self.year,
                self.group
            ),
            Language::Ru => format!(
                "{}, {} - {} - Группа {}",
                self.degree.name(lang),
                self.program.name(lang),
                self.year,
                self.full_code().localized(lang)
            ),
        }
    }
}

impl fmt::Display for ProgramIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug())
    }
}

impl FromStr for ProgramIdentity {
    type Err = SlugError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = slug.split('-').collect();
        let [degree, program, year, group] = parts.as_slice() else {
            return Err(SlugError::SegmentCount(parts.len()));
        };
        let program =
            Program::from_abbrev(program).ok_or_else(|| SlugError::UnknownProgram(program.to_string()))?;
        if !GROUP_CODE_RE.is_match(group) {
            return Err(SlugError::InvalidGroupCode(group.to_string()));
        }
        Ok(Self {
            degree: Degree::from_abbrev(degree),
            program,
            year: expand_year(year)?,
            group: GroupCode(group.to_ascii_uppercase()),
        })
    }
}

fn expand_year(short: &str) -> Result<u16, SlugError> {
    if short.len() != 2 || !short.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SlugError::InvalidYear(short.to_string()));
    }
    short
        .parse::<u16>()
        .map(|yy| MIN_YEAR + yy)
        .map_err(|_| SlugError::InvalidYear(short.to_string()))
}

/// Builds a slug from loosely typed selector input. Unknown programs are a
/// configuration error and fail instead of producing a placeholder code.
pub fn encode(
    program_name: &str,
    year: u16,
    group_code: &str,
    degree: Degree,
) -> Result<String, SlugError> {
    let program = Program::from_name(program_name)
        .or_else(|| Program::from_abbrev(program_name))
        .ok_or_else(|| SlugError::UnknownProgram(program_name.to_string()))?;
    if let Ok(full) = group_code.parse::<GroupFullCode>()
        && full.year() % 100 != year % 100
    {
        return Err(SlugError::InvalidFullCode(group_code.to_string()));
    }
    let group = group_code.parse::<GroupCode>()?;
    Ok(ProgramIdentity::new(degree, program, year, group)?.slug())
}

/// Resolves a slug to an identity. Malformed slugs resolve to nothing so
/// routing can fall back to a not-found view.
pub fn decode(slug: &str) -> Option<ProgramIdentity> {
    slug.parse::<ProgramIdentity>()
        .map_err(|err| tracing::debug!(slug, error = %err, "slug did not resolve"))
        .ok()
}

/// Public address of a group's timetable page.
pub fn canonical_url(base: &Url, identity: &ProgramIdentity) -> Result<Url, url::ParseError> {
    base.join(&format!("timetable/{}", identity.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(code: &str) -> GroupCode {
        code.parse().unwrap()
    }

    #[test]
    fn test_encode_known_program() {
        let slug = encode("Management", 2024, "B01", Degree::Bachelor).unwrap();
        assert_eq!(slug, "bak-men-24-b01");
        let slug = encode("Business Analytics and Big Data", 2023, "m04", Degree::Master).unwrap();
        assert_eq!(slug, "mag-babd-23-m04");
    }

    #[test]
    fn test_encode_accepts_full_code() {
        let slug = encode("Corporate Finance", 2024, "24.M02-vshm", Degree::Master).unwrap();
        assert_eq!(slug, "mag-cfin-24-m02");
    }

    #[test]
    fn test_encode_rejects_mismatched_full_code_year() {
        let err = encode("Corporate Finance", 2023, "24.M02-vshm", Degree::Master).unwrap_err();
        assert!(matches!(err, SlugError::InvalidFullCode(_)));
    }

    #[test]
    fn test_encode_unknown_program_fails() {
        let err = encode("Astrophysics", 2024, "B01", Degree::Bachelor).unwrap_err();
        assert_eq!(err, SlugError::UnknownProgram("Astrophysics".to_string()));
    }

    #[test]
    fn test_encode_year_out_of_range() {
        let err = encode("Management", 1999, "B01", Degree::Bachelor).unwrap_err();
        assert_eq!(err, SlugError::YearOutOfRange(1999));
        assert!(encode("Management", 2100, "B01", Degree::Bachelor).is_err());
    }

    #[test]
    fn test_decode_slug() {
        let identity = decode("bak-men-24-b01").unwrap();
        assert_eq!(identity.degree, Degree::Bachelor);
        assert_eq!(identity.program, Program::Management);
        assert_eq!(identity.year, 2024);
        assert_eq!(identity.group.as_str(), "B01");
        assert_eq!(identity.full_code().to_string(), "24.B01-vshm");
    }

    #[test]
    fn test_decode_wrong_segment_count() {
        for slug in ["", "bak", "bak-men-24", "bak-men-24-b01-x", "bak--men-24-b01", "-"] {
            assert!(decode(slug).is_none(), "{slug} should not decode");
        }
        assert_eq!(
            "bak-men".parse::<ProgramIdentity>().unwrap_err(),
            SlugError::SegmentCount(2)
        );
    }

    #[test]
    fn test_decode_unknown_program() {
        assert!(decode("bak-xyz-24-b01").is_none());
        assert_eq!(
            "bak-xyz-24-b01".parse::<ProgramIdentity>().unwrap_err(),
            SlugError::UnknownProgram("xyz".to_string())
        );
    }

    #[test]
    fn test_decode_rejects_bad_year_and_group() {
        assert!(decode("bak-men-2024-b01").is_none());
        assert!(decode("bak-men-x4-b01").is_none());
        assert!(decode("bak-men-24-b1").is_none());
        assert!(decode("bak-men-24-001").is_none());
    }

    #[test]
    fn test_decode_degree_is_permissive() {
        assert_eq!(decode("mag-scm-22-m03").unwrap().degree, Degree::Master);
        assert_eq!(decode("xyz-scm-22-m03").unwrap().degree, Degree::Bachelor);
    }

    #[test]
    fn test_round_trip_all_identities() {
        let letters = 'A'..='Z';
        let numbers = [0u8, 1, 9, 10, 42, 99];
        for letter in letters {
            for number in numbers {
                let code = group(&format!("{letter}{number:02}"));
                for degree in Degree::ALL {
                    for program in Program::ALL {
                        for year in MIN_YEAR..=MAX_YEAR {
                            let identity =
                                ProgramIdentity::new(degree, program, year, code.clone()).unwrap();
                            assert_eq!(decode(&identity.slug()).as_ref(), Some(&identity));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_program_table_is_bijective() {
        for program in Program::ALL {
            assert_eq!(program.entry().program, program);
            assert_eq!(Program::from_abbrev(program.abbrev()), Some(program));
            assert_eq!(Program::from_name(program.name(Language::En)), Some(program));
        }
    }

    #[test]
    fn test_full_code_parse_and_display() {
        let full: GroupFullCode = "21.b07-VSHM".parse().unwrap();
        assert_eq!(full.year(), 2021);
        assert_eq!(full.to_string(), "21.B07-vshm");
        assert!("21.B07".parse::<GroupFullCode>().is_err());
        assert!("2021.B07-vshm".parse::<GroupFullCode>().is_err());
    }

    #[test]
    fn test_full_code_localized() {
        let full: GroupFullCode = "24.B01-vshm".parse().unwrap();
        assert_eq!(full.localized(Language::Ru), "24.Б01-вшм");
        assert_eq!(full.localized(Language::En), "24.B01-vshm");
    }

    #[test]
    fn test_infer_program_from_group() {
        assert_eq!(Program::infer_from_group(&group("b03")), Some(Program::Management));
        assert_eq!(
            Program::infer_from_group(&group("b10")),
            Some(Program::PublicAdministration)
        );
        assert_eq!(
            Program::infer_from_group(&group("b12")),
            Some(Program::InternationalManagement)
        );
        assert_eq!(
            Program::infer_from_group(&group("m04")),
            Some(Program::BusinessAnalytics)
        );
        assert_eq!(Program::infer_from_group(&group("b13")), None);
        assert_eq!(Program::infer_from_group(&group("a01")), None);
    }

    #[test]
    fn test_canonical_url() {
        let base = Url::parse("https://timetable.example.org/").unwrap();
        let identity = decode("mag-mmen-25-m01").unwrap();
        assert_eq!(
            canonical_url(&base, &identity).unwrap().as_str(),
            "https://timetable.example.org/timetable/mag-mmen-25-m01"
        );
    }

    #[test]
    fn test_display_name() {
        let identity = decode("bak-men-24-b01").unwrap();
        assert_eq!(
            identity.display_name(Language::En),
            "Bachelor's in Management - 2024 - Group B01"
        );
    }
}
