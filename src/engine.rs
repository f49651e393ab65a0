use crate::config::Config;
use crate::host::{FixtureHost, Host, SystemHost};
use crate::inventory::Inventory;
use crate::models::SystemSnapshot;
use crate::mutation::MutationController;
use crate::status;
use crate::util::action_log::ActionLog;
use std::sync::Arc;

/// The inspection and mutation core, wired to one host. Shared between
/// threads through `Arc<Engine>`.
pub struct Engine {
    host:      Arc<dyn Host>,
    inventory: Arc<Inventory>,
    mutations: MutationController,
    config:    Config,
}

impl Engine {
    pub fn new(config: Config, host: Arc<dyn Host>, log: ActionLog) -> Self {
        let inventory = Arc::new(Inventory::new(host.clone(), &config));
        let mutations = MutationController::new(host.clone(), inventory.clone(), &config, log);
        Self { host, inventory, mutations, config }
    }

    /// Real host, or the demo fixture when `fixture` is set. Mutations are
    /// recorded in the default action log either way.
    pub fn from_config(config: Config, fixture: bool) -> Self {
        let host: Arc<dyn Host> = if fixture {
            tracing::info!("using fixture host with demo data");
            Arc::new(FixtureHost::demo())
        } else {
            Arc::new(SystemHost::new(config.general.use_sudo, config.general.command_timeout()))
        };
        Self::new(config, host, ActionLog::default_location())
    }

    pub fn snapshot(&self) -> SystemSnapshot {
        status::collect(self.host.as_ref(), &self.inventory, &self.config.services)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn mutations(&self) -> &MutationController {
        &self.mutations
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
