use crate::store::{CollectionPath, DocumentStore, StoreError, Write, WriteMode};

pub const DASHBOARD_USERS: &str = "dashboard_users";

/// Grants dashboard access by writing one admin document per email.
pub async fn seed_users(store: &dyn DocumentStore, emails: &[String]) -> Result<(), StoreError> {
    let users = CollectionPath::root(DASHBOARD_USERS);
    for email in emails {
        let write = Write::default()
            .field("email", email.as_str())
            .field("role", "admin")
            .server_timestamp("createdAt");
        store.set(&users.doc(email), write, WriteMode::Overwrite).await?;
        log::info!("Added/Updated: {email}");
    }
    Ok(())
}
