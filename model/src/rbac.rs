use crate::constants::{CLUSTER_ADMIN_BINDING, CLUSTER_ADMIN_ROLE};
use crate::error::Result;
use crate::k8s::ClusterApi;
use crate::system::{cluster_admin_binding, user_subject};
use log::{info, warn};
use serde::Serialize;

/// What happened when binding cluster-admin.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingOutcome {
    /// The binding was created for the account.
    Created,
    /// The binding already grants the account cluster-admin.
    AlreadyBound,
    /// A binding with the same name exists for other subjects. It is left alone.
    ExistsForOther { subjects: Vec<String> },
    /// A binding with the same name refers to a role other than cluster-admin. It is left alone.
    BindsOtherRole { role: String },
}

/// Grant `account` the cluster-admin role through `cluster-admin-binding`. The binding is only
/// ever created, never modified.
pub async fn bind_cluster_admin<C>(client: &C, account: &str) -> Result<BindingOutcome>
where
    C: ClusterApi + ?Sized,
{
    let outcome = match client.cluster_role_binding(CLUSTER_ADMIN_BINDING).await? {
        None => {
            client
                .create_cluster_role_binding(&cluster_admin_binding(account))
                .await?;
            info!(
                "Created cluster role binding '{}' for '{}'",
                CLUSTER_ADMIN_BINDING, account
            );
            BindingOutcome::Created
        }
        Some(existing) if existing.role_ref.name != CLUSTER_ADMIN_ROLE => {
            warn!(
                "Cluster role binding '{}' refers to role '{}', not '{}'; leaving it unchanged",
                CLUSTER_ADMIN_BINDING, existing.role_ref.name, CLUSTER_ADMIN_ROLE
            );
            BindingOutcome::BindsOtherRole {
                role: existing.role_ref.name,
            }
        }
        Some(existing) => {
            let subjects = existing.subjects.unwrap_or_default();
            let wanted = user_subject(account);
            if subjects
                .iter()
                .any(|s| s.kind == wanted.kind && s.name == wanted.name)
            {
                info!(
                    "Cluster role binding '{}' already grants '{}' cluster-admin",
                    CLUSTER_ADMIN_BINDING, account
                );
                BindingOutcome::AlreadyBound
            } else {
                let subjects: Vec<String> = subjects
                    .into_iter()
                    .map(|s| format!("{}:{}", s.kind, s.name))
                    .collect();
                warn!(
                    "Cluster role binding '{}' exists for {:?}, not for '{}'; leaving it unchanged",
                    CLUSTER_ADMIN_BINDING, subjects, account
                );
                BindingOutcome::ExistsForOther { subjects }
            }
        }
    };
    Ok(outcome)
}
