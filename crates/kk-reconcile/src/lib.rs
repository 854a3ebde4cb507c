//! Desired-state dispatch.
//!
//! [`reconcile`] is the whole control flow of a module run: render the
//! canonical principal name, issue the one backend call the desired state
//! requires, and fold the outcome into a [`ModuleReport`]. There is no
//! current-state probe and no retry; idempotency comes solely from how the
//! backend reacts to the command.

use kk_common::{DesiredState, ModuleReport, ReconcileRequest};
use kk_store::{PrincipalStore, StoreError};
use tracing::{debug, warn};

/// Apply one reconciliation order against the injected store.
///
/// Exactly one store call per invocation:
///
/// - `Present` creates the principal, passing the credential and any
///   attributes token. An already existing principal is a no-op success.
/// - `Absent` deletes it. An already missing principal is a no-op success.
/// - `Change` re-keys it with the same credential rules as `Present` but
///   never passes attributes, and has no no-op carve-out: any backend
///   complaint is a failure.
pub async fn reconcile(request: &ReconcileRequest, store: &dyn PrincipalStore) -> ModuleReport {
    let principal = request.principal.to_string();
    let credential = request.credential();

    debug!(
        %principal,
        state = %request.state,
        backend = store.backend(),
        random_key = credential.is_random(),
        "Reconciling principal"
    );

    match request.state {
        DesiredState::Present => {
            match store
                .create(&principal, &credential, request.attributes.as_deref())
                .await
            {
                Ok(()) => ModuleReport::changed("User was created"),
                Err(StoreError::AlreadyExists(_)) => {
                    ModuleReport::unchanged(format!("User {principal} already is created"))
                }
                Err(error) => failure(error),
            }
        }
        DesiredState::Absent => match store.delete(&principal).await {
            Ok(()) => ModuleReport::changed("User was deleted"),
            Err(StoreError::NotFound(_)) => {
                ModuleReport::unchanged(format!("User {principal} not exist"))
            }
            Err(error) => failure(error),
        },
        DesiredState::Change => match store.change_password(&principal, &credential).await {
            Ok(()) => ModuleReport::changed("Password was changed"),
            Err(error) => failure(error),
        },
    }
}

fn failure(error: StoreError) -> ModuleReport {
    warn!(%error, "Backend call failed");
    ModuleReport::failure(error.to_string())
}
