use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{BilingualText, Group, ScheduleEventInstance, ScheduleEventPrototype, StoredEvent};
use crate::slug::{GroupFullCode, ProgramIdentity};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Group {0} not found")]
    GroupNotFound(i64),
    #[error("Schedule event {0} not found")]
    EventNotFound(i64),
    #[error("Group {0} already exists")]
    DuplicateGroup(String),
}

/// In-memory group and schedule storage shared by the request handlers.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    groups: BTreeMap<i64, Group>,
    events: BTreeMap<i64, StoredEvent>,
    next_group_id: i64,
    next_event_id: i64,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(
        &mut self,
        identity: ProgramIdentity,
        name: BilingualText,
    ) -> Result<&Group, StoreError> {
        let full_code = identity.full_code();
        if self.find_group(&full_code).is_some() {
            return Err(StoreError::DuplicateGroup(full_code.to_string()));
        }
        self.next_group_id += 1;
        let id = self.next_group_id;
        Ok(&*self.groups.entry(id).or_insert(Group { id, identity, name }))
    }

    pub fn group(&self, id: i64) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn find_group(&self, full_code: &GroupFullCode) -> Option<&Group> {
        self.groups
            .values()
            .find(|group| group.identity.full_code() == *full_code)
    }

    /// All groups, newest year first, then by group code.
    pub fn groups(&self) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self.groups.values().collect();
        groups.sort_by(|a, b| {
            b.identity
                .year
                .cmp(&a.identity.year)
                .then(a.identity.group.cmp(&b.identity.group))
        });
        groups
    }

    /// Rewrites a group in place. Events reference groups by id, so they
    /// follow the group to its new identity.
    pub fn update_group(
        &mut self,
        id: i64,
        identity: ProgramIdentity,
        name: BilingualText,
    ) -> Result<&Group, StoreError> {
        if !self.groups.contains_key(&id) {
            return Err(StoreError::GroupNotFound(id));
        }
        let full_code = identity.full_code();
        if self
            .find_group(&full_code)
            .is_some_and(|other| other.id != id)
        {
            return Err(StoreError::DuplicateGroup(full_code.to_string()));
        }
        let group = self
            .groups
            .get_mut(&id)
            .ok_or(StoreError::GroupNotFound(id))?;
        group.identity = identity;
        group.name = name;
        Ok(&*group)
    }

    /// Removes a group together with its events; returns how many events
    /// went with it.
    pub fn delete_group(&mut self, id: i64) -> Result<usize, StoreError> {
        self.groups
            .remove(&id)
            .ok_or(StoreError::GroupNotFound(id))?;
        let before = self.events.len();
        self.events.retain(|_, event| event.group_id != id);
        Ok(before - self.events.len())
    }

    pub fn insert_events(
        &mut self,
        group_id: i64,
        instances: Vec<ScheduleEventInstance>,
    ) -> Result<Vec<i64>, StoreError> {
        if !self.groups.contains_key(&group_id) {
            return Err(StoreError::GroupNotFound(group_id));
        }
        let ids = instances
            .into_iter()
            .map(|instance| {
                self.next_event_id += 1;
                let id = self.next_event_id;
                self.events.insert(
                    id,
                    StoredEvent {
                        id,
                        group_id,
                        instance,
                    },
                );
                id
            })
            .collect();
        Ok(ids)
    }

    /// Events of a group ordered by date and start time, optionally limited
    /// to an inclusive date range.
    pub fn events_for_group(
        &self,
        group_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<&StoredEvent> {
        let mut events: Vec<&StoredEvent> = self
            .events
            .values()
            .filter(|event| event.group_id == group_id)
            .filter(|event| from.is_none_or(|from| event.instance.date >= from))
            .filter(|event| to.is_none_or(|to| event.instance.date <= to))
            .collect();
        events.sort_by(|a, b| {
            a.instance
                .date
                .cmp(&b.instance.date)
                .then(a.instance.details.start_time.cmp(&b.instance.details.start_time))
                .then(a.id.cmp(&b.id))
        });
        events
    }

    /// Rewrites a single stored occurrence. Sibling occurrences created by the
    /// same recurrence are left untouched.
    pub fn update_event(
        &mut self,
        id: i64,
        prototype: ScheduleEventPrototype,
    ) -> Result<&StoredEvent, StoreError> {
        let event = self
            .events
            .get_mut(&id)
            .ok_or(StoreError::EventNotFound(id))?;
        event.instance.details = prototype.details;
        event.instance.date = prototype.date;
        Ok(&*event)
    }

    pub fn delete_event(&mut self, id: i64) -> Result<(), StoreError> {
        self.events
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::EventNotFound(id))
    }
}
