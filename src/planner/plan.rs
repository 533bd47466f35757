//! Change plan types and construction.
//!
//! A plan lists, per resource instance, the exact lines one write cycle will
//! send. Updates are full replacements: the managed subtree is deleted and
//! every set line re-emitted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::CommandSet;
use crate::config::{ConfigHasher, ResourcesConfig};
use crate::error::{ConfigError, ValidationError};
use crate::resource::{
    Resource, ResourceKind, Security, SystemLoginUser, SystemRootAuthentication,
};

/// A complete change plan.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePlan {
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    /// Fingerprint of every command in the plan, in order.
    pub config_hash: String,
    /// Planned actions in execution order.
    pub actions: Vec<PlannedAction>,
}

/// A single planned action.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    /// Action type.
    pub action_type: ActionType,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Resource id.
    pub id: String,
    /// Lines to send, in order.
    pub commands: CommandSet,
}

/// Types of actions in a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Set the resource's lines.
    Create,
    /// Delete the managed subtree, then set the lines again.
    Update,
    /// Delete the managed subtree.
    Delete,
    /// Nothing to send.
    Noop,
}

impl ActionType {
    /// Verb used in commit messages.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Noop => "noop",
        }
    }
}

impl PlannedAction {
    /// Plans the creation of a resource.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the options.
    pub fn create<R: Resource>(options: &R::Options) -> Result<Self, ValidationError> {
        Ok(Self {
            action_type: ActionType::Create,
            kind: R::KIND,
            id: R::identifier(options),
            commands: R::render(options)?,
        })
    }

    /// Plans a full replacement of resource `id`.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the options, or an error if the
    /// options name another instance than `id`.
    pub fn update<R: Resource>(id: &str, options: &R::Options) -> Result<Self, ValidationError> {
        let identifier = R::identifier(options);
        if identifier != id {
            return Err(ValidationError::InvalidValue {
                field: String::from("name"),
                value: identifier,
                expected: id.to_string(),
            });
        }
        let mut commands = R::delete_lines(id);
        commands.extend(R::render(options)?);
        Ok(Self {
            action_type: ActionType::Update,
            kind: R::KIND,
            id: id.to_string(),
            commands,
        })
    }

    /// Plans the removal of resource `id`.
    ///
    /// Singletons are never removed from the device, so their removal is a
    /// no-op.
    #[must_use]
    pub fn delete<R: Resource>(id: &str) -> Self {
        if R::KIND.is_singleton() {
            return Self {
                action_type: ActionType::Noop,
                kind: R::KIND,
                id: id.to_string(),
                commands: CommandSet::new(),
            };
        }
        Self {
            action_type: ActionType::Delete,
            kind: R::KIND,
            id: id.to_string(),
            commands: R::delete_lines(id),
        }
    }

    /// Commit message for this action.
    #[must_use]
    pub fn commit_message(&self) -> String {
        format!("{} resource {}", self.action_type.verb(), self.kind.type_name())
    }

    /// Returns a human-readable description of the action.
    #[must_use]
    pub fn description(&self) -> String {
        match self.action_type {
            ActionType::Create => format!("Create {} '{}'", self.kind, self.id),
            ActionType::Update => format!("Replace {} '{}'", self.kind, self.id),
            ActionType::Delete => format!("Delete {} '{}'", self.kind, self.id),
            ActionType::Noop => format!("No change for {} '{}'", self.kind, self.id),
        }
    }
}

impl ChangePlan {
    /// Builds a plan from actions, fingerprinting their commands.
    #[must_use]
    pub fn new(actions: Vec<PlannedAction>) -> Self {
        let mut all = CommandSet::new();
        for action in &actions {
            all.extend(action.commands.clone());
        }
        Self {
            created_at: Utc::now(),
            config_hash: ConfigHasher::new().hash_sequence(&all),
            actions,
        }
    }

    /// Plans every resource declared in a resources file.
    ///
    /// With `update`, every resource is planned as a full replacement of its
    /// current configuration instead of a creation.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first resource that fails validation.
    pub fn from_resources(resources: &ResourcesConfig, update: bool) -> Result<Self, ConfigError> {
        let mut actions = Vec::with_capacity(resources.count());

        if let Some(security) = &resources.security {
            actions.push(plan_one::<Security>(security, update, "resources.security")?);
        }
        if let Some(root) = &resources.root_authentication {
            actions.push(plan_one::<SystemRootAuthentication>(
                root,
                update,
                "resources.root_authentication",
            )?);
        }
        for (i, user) in resources.login_users.iter().enumerate() {
            actions.push(plan_one::<SystemLoginUser>(
                user,
                update,
                &format!("resources.login_users[{i}]"),
            )?);
        }

        Ok(Self::new(actions))
    }

    /// Returns true if no action sends any line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.iter().all(|a| a.commands.is_empty())
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the number of actions of a type.
    #[must_use]
    pub fn count(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }

    /// Returns every line of the plan, in execution order.
    #[must_use]
    pub fn commands(&self) -> CommandSet {
        let mut all = CommandSet::new();
        for action in &self.actions {
            all.extend(action.commands.clone());
        }
        all
    }
}

fn plan_one<R: Resource>(
    options: &R::Options,
    update: bool,
    field: &str,
) -> Result<PlannedAction, ConfigError> {
    let planned = if update {
        PlannedAction::update::<R>(&R::identifier(options), options)
    } else {
        PlannedAction::create::<R>(options)
    };
    planned.map_err(|source| ConfigError::InvalidResource {
        field: field.to_string(),
        source,
    })
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

impl std::fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.description())?;
        for line in &self.commands {
            writeln!(f, "    {line}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for ChangePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No changes required");
        }

        writeln!(f, "Change Plan ({} actions):", self.actions.len())?;
        for (i, action) in self.actions.iter().enumerate() {
            write!(f, "  {i}. {action}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        LoginUserOptions, Security, SecurityOptions, SystemLoginUser, SystemRootAuthOptions,
        SystemRootAuthentication, UtmOptions,
    };

    fn root_auth() -> SystemRootAuthOptions {
        SystemRootAuthOptions {
            encrypted_password: String::from("$1$abc"),
            no_public_keys: true,
            ssh_public_keys: std::collections::BTreeSet::new(),
        }
    }

    #[test]
    fn test_update_deletes_then_sets() {
        let action =
            PlannedAction::update::<SystemRootAuthentication>("system_root_authentication", &root_auth())
                .unwrap();

        assert_eq!(action.action_type, ActionType::Update);
        assert_eq!(
            action.commands.lines(),
            [
                "delete system root-authentication",
                "set system root-authentication encrypted-password \"$1$abc\"",
                "set system root-authentication no-public-keys",
            ]
        );
        assert_eq!(
            action.commit_message(),
            "update resource junos_system_root_authentication"
        );
    }

    #[test]
    fn test_update_rejects_rename() {
        let user = LoginUserOptions {
            name: String::from("bob"),
            class: String::from("operator"),
            ..LoginUserOptions::default()
        };
        let err = PlannedAction::update::<SystemLoginUser>("alice", &user).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));
    }

    #[test]
    fn test_singleton_delete_is_noop() {
        let action = PlannedAction::delete::<Security>("security");
        assert_eq!(action.action_type, ActionType::Noop);
        assert!(action.commands.is_empty());

        let action = PlannedAction::delete::<SystemLoginUser>("testacc");
        assert_eq!(action.commands.lines(), ["delete system login user testacc"]);
    }

    #[test]
    fn test_plan_fingerprint_and_counts() {
        let security = SecurityOptions {
            ike_traceoptions: None,
            utm: Some(UtmOptions {
                feature_profile_web_filtering_type: Some(String::from("juniper-enhanced")),
            }),
        };
        let plan = ChangePlan::new(vec![
            PlannedAction::create::<Security>(&security).unwrap(),
            PlannedAction::create::<SystemRootAuthentication>(&root_auth()).unwrap(),
        ]);
        let again = ChangePlan::new(plan.actions.clone());

        assert_eq!(plan.count(ActionType::Create), 2);
        assert_eq!(plan.commands().len(), 3);
        assert_eq!(plan.config_hash, again.config_hash);
        assert!(plan.to_string().contains("Create junos_security 'security'"));
    }

    #[test]
    fn test_from_resources() {
        let resources = ResourcesConfig {
            security: None,
            root_authentication: Some(root_auth()),
            login_users: vec![LoginUserOptions {
                name: String::from("ops"),
                class: String::from("operator"),
                ..LoginUserOptions::default()
            }],
        };

        let plan = ChangePlan::from_resources(&resources, false).unwrap();
        assert_eq!(plan.count(ActionType::Create), 2);
        assert_eq!(plan.actions[1].id, "ops");

        let plan = ChangePlan::from_resources(&resources, true).unwrap();
        assert_eq!(plan.count(ActionType::Update), 2);
        assert_eq!(
            plan.actions[1].commands.lines()[0],
            "delete system login user ops"
        );
    }

    #[test]
    fn test_from_resources_names_invalid_entry() {
        let resources = ResourcesConfig {
            login_users: vec![LoginUserOptions {
                name: String::from("ops"),
                class: String::new(),
                ..LoginUserOptions::default()
            }],
            ..ResourcesConfig::default()
        };
        let err = ChangePlan::from_resources(&resources, false).unwrap_err();
        assert!(err.to_string().contains("resources.login_users[0]"));
    }

    #[test]
    fn test_empty_plan_display() {
        let plan = ChangePlan::new(vec![PlannedAction::delete::<Security>("security")]);
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "No changes required");
    }
}
