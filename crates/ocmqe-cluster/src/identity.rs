//! Identity providers, users and groups

use base64::Engine;
use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ClusterError, Result};
use crate::manager::ClusterManager;
use crate::ocm::CLUSTERS_API;
use crate::types::ClusterHandle;

/// Groups that live on the cluster rather than in OCM
pub const CLUSTER_LOCAL_GROUPS: &[&str] = &["rhods-admins", "rhods-users", "rhods-noaccess"];

/// OCM group with cluster-admin rights
pub const CLUSTER_ADMINS_GROUP: &str = "cluster-admins";

/// Characters OSD accepts in LDAP user names, one special user each
pub const SPECIAL_USER_CHARS: &[char] = &['.', '^', '$', '*', '?', '[', ']', '{', '}', '@'];

/// An identity provider to configure
#[derive(Debug, Clone)]
pub enum IdentityProvider {
    Htpasswd(HtpasswdIdp),
    Ldap(LdapIdp),
}

impl IdentityProvider {
    pub fn name(&self) -> &str {
        match self {
            IdentityProvider::Htpasswd(idp) => &idp.name,
            IdentityProvider::Ldap(idp) => &idp.name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HtpasswdIdp {
    pub name: String,
    pub admin_user: String,
    pub admin_password: String,
}

#[derive(Debug, Clone)]
pub struct LdapIdp {
    pub name: String,
    pub url: String,
    pub bind_dn: String,
    /// Base64-encoded bind password
    pub bind_password: String,
    /// Prepared OpenLDAP deployment manifest
    pub manifest: Utf8PathBuf,
    pub users_per_group: u32,
}

impl LdapIdp {
    /// Decode the base64 bind password
    pub fn decoded_bind_password(&self) -> Result<String> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.bind_password.trim())
            .map_err(|e| ClusterError::InvalidBindPassword {
                message: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| ClusterError::InvalidBindPassword {
            message: e.to_string(),
        })
    }

    /// Body of `POST /clusters/<id>/identity_providers`
    pub fn request(&self) -> Result<LdapIdpRequest> {
        Ok(LdapIdpRequest {
            kind: "LDAPIdentityProvider",
            name: self.name.clone(),
            mapping_method: "claim",
            ldap: LdapSettings {
                url: self.url.clone(),
                bind_dn: self.bind_dn.clone(),
                bind_password: self.decoded_bind_password()?,
                insecure: true,
                attributes: LdapAttributes::default(),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LdapIdpRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub mapping_method: &'static str,
    pub ldap: LdapSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct LdapSettings {
    pub url: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub insecure: bool,
    pub attributes: LdapAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct LdapAttributes {
    pub id: Vec<String>,
    pub email: Vec<String>,
    pub name: Vec<String>,
    pub preferred_username: Vec<String>,
}

impl Default for LdapAttributes {
    fn default() -> Self {
        Self {
            id: vec!["dn".to_string()],
            email: vec!["mail".to_string()],
            name: vec!["cn".to_string()],
            preferred_username: vec!["uid".to_string()],
        }
    }
}

/// A user in a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub user: String,
    pub group: String,
}

impl Membership {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }
}

/// Outcome of populating the rhods groups
#[derive(Debug, Clone, Default)]
pub struct GroupSyncReport {
    pub added: Vec<Membership>,
    pub failed: Vec<(Membership, String)>,
}

impl GroupSyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Memberships created for `users_per_group` LDAP users per group
pub fn rhods_memberships(users_per_group: u32) -> Vec<Membership> {
    let mut memberships = Vec::new();
    for i in 1..=users_per_group {
        let user = format!("ldap-admin{}", i);
        memberships.push(Membership::new(&user, "rhods-admins"));
        memberships.push(Membership::new(&user, "dedicated-admins"));
    }
    for i in 1..=users_per_group {
        memberships.push(Membership::new(format!("ldap-user{}", i), "rhods-users"));
    }
    for c in SPECIAL_USER_CHARS {
        memberships.push(Membership::new(format!("ldap-special{}", c), "rhods-users"));
    }
    for i in 1..=users_per_group {
        memberships.push(Membership::new(
            format!("ldap-noaccess{}", i),
            "rhods-noaccess",
        ));
    }
    memberships
}

fn is_cluster_local(group: &str) -> bool {
    CLUSTER_LOCAL_GROUPS.contains(&group)
}

impl ClusterManager {
    /// Configure an identity provider and let it settle
    pub async fn create_idp(&self, handle: &ClusterHandle, idp: &IdentityProvider) -> Result<()> {
        match idp {
            IdentityProvider::Htpasswd(htpasswd) => {
                info!("Creating htpasswd identity provider {}", htpasswd.name);
                self.ocm()
                    .execute_with(|inv| {
                        inv.args(["create", "idp"])
                            .option("-c", handle.id())
                            .option("-t", "htpasswd")
                            .option("-n", &htpasswd.name)
                            .option("--username", &htpasswd.admin_user)
                            .secret_option("--password", &htpasswd.admin_password)
                    })
                    .await?;
                self.add_user_to_group(handle, &htpasswd.admin_user, CLUSTER_ADMINS_GROUP)
                    .await?;
            }
            IdentityProvider::Ldap(ldap) => {
                info!("Deploying OpenLDAP from {}", ldap.manifest);
                let request = ldap.request()?;
                self.oc().apply_file(&ldap.manifest).await?;

                info!("Creating LDAP identity provider {}", ldap.name);
                let path = format!("{}/{}/identity_providers", CLUSTERS_API, handle.id());
                self.ocm().post_json(&path, &request).await?;

                let report = self
                    .populate_rhods_groups(handle, ldap.users_per_group)
                    .await?;
                if !report.is_complete() {
                    warn!(
                        "{} of {} group memberships could not be created",
                        report.failed.len(),
                        report.failed.len() + report.added.len()
                    );
                }
            }
        }

        self.settle_for(idp.name(), self.settle().idp()).await;
        Ok(())
    }

    pub async fn delete_idp(&self, handle: &ClusterHandle, name: &str) -> Result<()> {
        info!("Deleting identity provider {}", name);
        self.ocm()
            .execute_with(|inv| {
                inv.args(["delete", "idp"])
                    .option("-c", handle.id())
                    .arg(name)
            })
            .await?;
        Ok(())
    }

    /// Names of the identity providers configured on the cluster
    pub async fn list_idps(&self, handle: &ClusterHandle) -> Result<Vec<String>> {
        let output = self
            .ocm()
            .query_with(|inv| {
                inv.args(["list", "idps", "--cluster", handle.id(), "--columns", "name"])
            })
            .await?;
        Ok(output
            .stdout
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn idp_exists(&self, handle: &ClusterHandle, name: &str) -> Result<bool> {
        Ok(self.list_idps(handle).await?.iter().any(|idp| idp == name))
    }

    /// Add a user to a group
    ///
    /// The rhods groups are cluster-local (`oc adm groups`); every other
    /// group is an OCM group.
    pub async fn add_user_to_group(
        &self,
        handle: &ClusterHandle,
        user: &str,
        group: &str,
    ) -> Result<()> {
        debug!("Adding {} to group {}", user, group);
        if is_cluster_local(group) {
            self.oc().add_user_to_group(group, user).await
        } else {
            self.ocm()
                .execute_with(|inv| {
                    inv.args(["create", "user", user, "--cluster", handle.id()])
                        .assign("--group", group)
                })
                .await?;
            Ok(())
        }
    }

    pub async fn delete_user(&self, handle: &ClusterHandle, user: &str, group: &str) -> Result<()> {
        info!("Deleting user {} from group {}", user, group);
        self.ocm()
            .execute_with(|inv| {
                inv.args(["delete", "user", user, "--cluster", handle.id()])
                    .assign("--group", group)
            })
            .await?;
        Ok(())
    }

    /// Create a cluster-local group
    pub async fn create_group(&self, group: &str) -> Result<()> {
        info!("Creating group {}", group);
        self.oc().create_group(group).await
    }

    /// Create the rhods groups and fill them with the LDAP test users
    ///
    /// Individual membership failures are collected in the report rather
    /// than aborting the run.
    pub async fn populate_rhods_groups(
        &self,
        handle: &ClusterHandle,
        users_per_group: u32,
    ) -> Result<GroupSyncReport> {
        for group in CLUSTER_LOCAL_GROUPS {
            if let Err(e) = self.create_group(group).await {
                warn!("Failed to create group {}: {}", group, e);
            }
        }

        let mut report = GroupSyncReport::default();
        for membership in rhods_memberships(users_per_group) {
            match self
                .add_user_to_group(handle, &membership.user, &membership.group)
                .await
            {
                Ok(()) => report.added.push(membership),
                Err(e) => {
                    warn!(
                        "Failed to add user {} to group {}: {}",
                        membership.user, membership.group, e
                    );
                    report.failed.push((membership, e.to_string()));
                }
            }
        }

        match self.oc().list("users").await {
            Ok(users) => info!("Users present in cluster:\n{}", users),
            Err(e) => debug!("Could not list users: {}", e),
        }
        match self.oc().list("groups").await {
            Ok(groups) => info!("Groups present in cluster:\n{}", groups),
            Err(e) => debug!("Could not list groups: {}", e),
        }

        Ok(report)
    }
}
