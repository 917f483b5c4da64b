//! Startup seeding of groups from a TOML catalog:
//!
//! ```toml
//! [[groups]]
//! degree = "bachelor"
//! program = "management"
//! year = 2024
//! code = "B01"
//! name_en = "Management, group B01"
//! name_ru = "Менеджмент, группа Б01"
//! ```

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::models::{BilingualText, Group, Language, NewGroup};
use crate::slug::{Degree, GroupCode, Program, ProgramIdentity};
use crate::store::ScheduleStore;

#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub groups: Vec<NewGroup>,
}

impl Catalog {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn seed(self, store: &mut ScheduleStore) -> Result<usize, ApiError> {
        let count = self.groups.len();
        for group in self.groups {
            create_group(store, group)?;
        }
        info!(count, "seeded groups from catalog");
        Ok(count)
    }
}

/// Resolves a group payload to its identity and display name. Missing
/// degree and program are inferred from the group code; empty names fall
/// back to the canonical full code.
fn resolve_group(new: NewGroup) -> Result<(ProgramIdentity, BilingualText), ApiError> {
    let code: GroupCode = new.code.parse()?;
    let degree = new
        .degree
        .or_else(|| Degree::from_group_prefix(code.prefix()))
        .ok_or_else(|| ApiError::BadRequest(format!("Cannot infer degree for group {code}")))?;
    let program = new
        .program
        .or_else(|| Program::infer_from_group(&code))
        .ok_or_else(|| ApiError::BadRequest(format!("Cannot infer program for group {code}")))?;
    let identity = ProgramIdentity::new(degree, program, new.year, code)?;
    let full_code = identity.full_code();
    let name_en = non_empty_or(new.name_en, || full_code.to_string());
    let name_ru = non_empty_or(new.name_ru, || full_code.localized(Language::Ru));
    Ok((identity, BilingualText::new(name_en, name_ru)))
}

pub fn create_group(store: &mut ScheduleStore, new: NewGroup) -> Result<&Group, ApiError> {
    let (identity, name) = resolve_group(new)?;
    Ok(store.insert_group(identity, name)?)
}

/// Replaces a group's identity and name. Its events stay attached.
pub fn update_group(
    store: &mut ScheduleStore,
    id: i64,
    new: NewGroup,
) -> Result<&Group, ApiError> {
    let (identity, name) = resolve_group(new)?;
    Ok(store.update_group(id, identity, name)?)
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [[groups]]
        degree = "bachelor"
        program = "management"
        year = 2024
        code = "B01"
        name_en = "Management B01"
        name_ru = "Менеджмент Б01"

        [[groups]]
        degree = "master"
        program = "corporate_finance"
        year = 2023
        code = "23.M02-vshm"
    "#;

    #[test]
    fn test_seed_from_toml() {
        let catalog = Catalog::from_toml(CATALOG).unwrap();
        let mut store = ScheduleStore::new();
        assert_eq!(catalog.seed(&mut store).unwrap(), 2);

        let groups = store.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].identity.slug(), "bak-men-24-b01");
        assert_eq!(groups[1].identity.program, Program::CorporateFinance);
        assert_eq!(groups[1].identity.degree, Degree::Master);
        assert_eq!(groups[1].name.en, "23.M02-vshm");
        assert_eq!(groups[1].name.ru, "23.М02-вшм");
    }

    #[test]
    fn test_create_group_rejects_bad_code() {
        let mut store = ScheduleStore::new();
        let new = NewGroup {
            degree: Some(Degree::Bachelor),
            program: Some(Program::Management),
            year: 2024,
            code: "B1".to_string(),
            name_en: String::new(),
            name_ru: String::new(),
        };
        assert!(matches!(create_group(&mut store, new), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_create_group_infers_degree_and_program() {
        let mut store = ScheduleStore::new();
        let new = NewGroup {
            degree: None,
            program: None,
            year: 2022,
            code: "m03".to_string(),
            name_en: String::new(),
            name_ru: String::new(),
        };
        let group = create_group(&mut store, new).unwrap();
        assert_eq!(group.identity.slug(), "mag-scm-22-m03");

        let unknown = NewGroup {
            degree: None,
            program: None,
            year: 2022,
            code: "b40".to_string(),
            name_en: String::new(),
            name_ru: String::new(),
        };
        assert!(matches!(create_group(&mut store, unknown), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_update_group_rederives_identity() {
        let mut store = ScheduleStore::new();
        Catalog::from_toml(CATALOG).unwrap().seed(&mut store).unwrap();
        let id = store.groups()[0].id;

        let renamed = NewGroup {
            degree: None,
            program: None,
            year: 2025,
            code: "b09".to_string(),
            name_en: "Public Administration B09".to_string(),
            name_ru: String::new(),
        };
        let group = update_group(&mut store, id, renamed).unwrap();
        assert_eq!(group.id, id);
        assert_eq!(group.identity.slug(), "bak-gmu-25-b09");
        assert_eq!(group.name.ru, "25.Б09-вшм");

        let clash = NewGroup {
            degree: Some(Degree::Master),
            program: Some(Program::CorporateFinance),
            year: 2023,
            code: "M02".to_string(),
            name_en: String::new(),
            name_ru: String::new(),
        };
        assert!(matches!(update_group(&mut store, id, clash), Err(ApiError::Conflict(_))));
    }
}
