use crate::error::Result;
use crate::k8s::ClusterApi;
use log::info;
use serde::Serialize;
use serde_plain::derive_display_from_serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UninstallOutcome {
    Deleted,
    /// There was no application with the given name. This is not an error.
    NotFound,
}

derive_display_from_serialize!(UninstallOutcome);

/// What `uninstall` removed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UninstallReport {
    pub application: UninstallOutcome,
    /// `true` only if the namespace deletion was requested and the namespace existed.
    pub namespace_deleted: bool,
}

/// Delete the `Application` object. The application's owner references make Kubernetes garbage
/// collect everything the deployer created. Optionally delete the namespace as well.
pub async fn uninstall<C>(
    client: &C,
    namespace: &str,
    name: &str,
    delete_namespace: bool,
) -> Result<UninstallReport>
where
    C: ClusterApi + ?Sized,
{
    let application = if client.delete_application(namespace, name).await? {
        info!("Deleted application '{}' in namespace '{}'", name, namespace);
        UninstallOutcome::Deleted
    } else {
        info!(
            "Application '{}' was not found in namespace '{}'",
            name, namespace
        );
        UninstallOutcome::NotFound
    };

    let namespace_deleted = delete_namespace && client.delete_namespace(namespace).await?;
    if namespace_deleted {
        info!("Deleted namespace '{}'", namespace);
    }

    Ok(UninstallReport {
        application,
        namespace_deleted,
    })
}
