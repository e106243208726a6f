use std::collections::HashSet;

use axum::extract::State;
use axum::{Extension, Json};

use marti_core::{Caller, ClientEndpoint, Contact, Envelope};

use super::AppState;

const ENDPOINT_TYPE: &str = "com.bbn.marti.remote.ClientEndpoint";

/// `GET /api/contacts/all` -- live contacts first, then upstream ones not
/// already listed.
#[allow(clippy::unused_async)]
pub async fn contacts(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Json<Vec<Contact>> {
    let mut contacts = state.sync.contacts(&caller);
    if let Some(upstream) = &state.upstream_contacts {
        let mut seen: HashSet<String> = contacts.iter().map(|c| c.uid.clone()).collect();
        contacts.extend(
            upstream
                .contacts()
                .into_iter()
                .filter(|c| seen.insert(c.uid.clone())),
        );
    }
    Json(contacts)
}

/// `GET /api/clientEndPoints`
#[allow(clippy::unused_async)]
pub async fn endpoints(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Json<Envelope<Vec<ClientEndpoint>>> {
    Json(Envelope::new(ENDPOINT_TYPE, state.sync.endpoints(&caller)))
}
