use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub const fn ordered() -> [Self; 2] {
        [Self::Admin, Self::Employee]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Employee => "Funcionário",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Identity and roles resolved once at a request boundary and passed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    actor: Option<Actor>,
    roles: BTreeSet<Role>,
}

impl AccessContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(actor: Actor, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            actor: Some(actor),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.actor.is_none()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.actor.is_some() && self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn require_actor(&self) -> Result<&Actor, AccessError> {
        self.actor.as_ref().ok_or(AccessError::Unauthenticated)
    }

    pub fn require_role(&self, role: Role) -> Result<&Actor, AccessError> {
        let actor = self.require_actor()?;
        if self.roles.contains(&role) {
            Ok(actor)
        } else {
            Err(AccessError::Forbidden { role })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("role '{}' required", .role.label())]
    Forbidden { role: Role },
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Current-user and role lookup implemented by the auth backend.
pub trait IdentityProvider: Send + Sync {
    fn resolve(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Actor>, IdentityError>> + Send;

    fn has_role(
        &self,
        actor: &Actor,
        role: Role,
    ) -> impl Future<Output = Result<bool, IdentityError>> + Send;

    /// Every known user profile, whether or not it holds a role.
    fn roster(&self) -> impl Future<Output = Result<Vec<Actor>, IdentityError>> + Send;
}

/// One row of the user administration listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: ActorId,
    pub display_name: Option<String>,
    pub role: Role,
    pub role_label: &'static str,
}

/// List every user with their effective role, ordered by name. Users without an admin
/// grant are reported as employees.
pub async fn list_users<P>(provider: &P) -> Result<Vec<UserSummary>, IdentityError>
where
    P: IdentityProvider,
{
    let mut users = Vec::new();
    for actor in provider.roster().await? {
        let role = if provider.has_role(&actor, Role::Admin).await? {
            Role::Admin
        } else {
            Role::Employee
        };
        users.push(UserSummary {
            id: actor.id,
            display_name: actor.display_name,
            role,
            role_label: role.label(),
        });
    }

    users.sort_by(|a, b| {
        let left = a.display_name.as_deref().unwrap_or(a.id.as_str());
        let right = b.display_name.as_deref().unwrap_or(b.id.as_str());
        left.cmp(right).then_with(|| a.id.cmp(&b.id))
    });
    Ok(users)
}

/// Resolve the caller's context, waiting at most `deadline`. Failures and timeouts yield
/// an anonymous context rather than leaving the request pending.
pub async fn resolve_context<P>(provider: &P, token: Option<&str>, deadline: Duration) -> AccessContext
where
    P: IdentityProvider,
{
    let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
        return AccessContext::anonymous();
    };

    match tokio::time::timeout(deadline, lookup(provider, token)).await {
        Ok(Ok(context)) => context,
        Ok(Err(err)) => {
            warn!(error = %err, "identity lookup failed; continuing as anonymous");
            AccessContext::anonymous()
        }
        Err(_) => {
            warn!(?deadline, "identity lookup timed out; continuing as anonymous");
            AccessContext::anonymous()
        }
    }
}

async fn lookup<P>(provider: &P, token: &str) -> Result<AccessContext, IdentityError>
where
    P: IdentityProvider,
{
    let Some(actor) = provider.resolve(token).await? else {
        return Ok(AccessContext::anonymous());
    };

    let mut roles = BTreeSet::new();
    for role in Role::ordered() {
        match provider.has_role(&actor, role).await {
            Ok(true) => {
                roles.insert(role);
            }
            Ok(false) => {}
            // a failed role check denies the role but keeps the session
            Err(err) => warn!(actor = %actor.id, ?role, error = %err, "role lookup failed"),
        }
    }

    debug!(actor = %actor.id, ?roles, "resolved access context");
    Ok(AccessContext { actor: Some(actor), roles })
}

/// Fixed token-to-actor directory backing local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct ActorDirectory {
    entries: HashMap<String, (Actor, BTreeSet<Role>)>,
}

impl ActorDirectory {
    pub fn with_actor(
        mut self,
        token: impl Into<String>,
        actor: Actor,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.entries
            .insert(token.into(), (actor, roles.into_iter().collect()));
        self
    }
}

impl IdentityProvider for ActorDirectory {
    async fn resolve(&self, token: &str) -> Result<Option<Actor>, IdentityError> {
        Ok(self.entries.get(token).map(|(actor, _)| actor.clone()))
    }

    async fn has_role(&self, actor: &Actor, role: Role) -> Result<bool, IdentityError> {
        Ok(self
            .entries
            .values()
            .any(|(known, roles)| known.id == actor.id && roles.contains(&role)))
    }

    async fn roster(&self) -> Result<Vec<Actor>, IdentityError> {
        let mut actors: Vec<Actor> = Vec::new();
        for (actor, _) in self.entries.values() {
            if !actors.iter().any(|known| known.id == actor.id) {
                actors.push(actor.clone());
            }
        }
        Ok(actors)
    }
}
