use std::collections::HashMap;

use crate::config::{BotConfig, BotKind};

/// A bot this service answers for.
#[derive(Debug, Clone, PartialEq)]
pub struct BotIdentity {
    /// Selects the logging namespace and, through `kind`, the handler set
    pub name: String,
    pub token: String,
    pub kind: BotKind,
}

/// Immutable webhook path -> bot table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct BotRegistry {
    by_path: HashMap<String, BotIdentity>,
}

impl BotRegistry {
    pub fn from_config(bots: &[BotConfig]) -> Self {
        let by_path = bots
            .iter()
            .map(|bot| {
                (
                    bot.path.clone(),
                    BotIdentity {
                        name: bot.name.clone(),
                        token: bot.token.clone(),
                        kind: bot.kind,
                    },
                )
            })
            .collect();
        Self { by_path }
    }

    /// Exact match on the full request path. `None` is a normal outcome.
    pub fn resolve(&self, path: &str) -> Option<&BotIdentity> {
        self.by_path.get(path)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&BotIdentity> {
        self.by_path.values().find(|identity| identity.name == name)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }
}
