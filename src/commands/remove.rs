//! Delete an event, or exclude a single occurrence from its series.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use tempo_core::{parse_instance_id, Mutation};

use crate::store::Store;

pub fn run(store: &mut Store, id: &str, occurrence: Option<NaiveDate>) -> Result<()> {
    // "This occurrence only" takes the same exception path as a fork,
    // just without a replacement event.
    let exception = match (parse_instance_id(id), occurrence) {
        (_, Some(date)) => {
            let parent_id = match parse_instance_id(id) {
                Some((parent, _)) => parent.to_string(),
                None => id.to_string(),
            };
            Some((parent_id, date))
        }
        (Some((parent, date)), None) => Some((parent.to_string(), date)),
        (None, None) => None,
    };

    match exception {
        Some((parent_id, date)) => {
            if store.get(&parent_id).is_none() {
                bail!("No event '{}' in store", parent_id);
            }
            store.apply(Mutation::AddException {
                parent_id: parent_id.clone(),
                date,
            });
            store.save()?;
            println!("Removed the {} occurrence of {}", date, parent_id);
        }
        None => {
            if !store.delete(id) {
                bail!("No event '{}' in store", id);
            }
            store.save()?;
            println!("Deleted {}", id);
        }
    }

    Ok(())
}
