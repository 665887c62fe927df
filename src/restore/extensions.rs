//! Extension restore: install requests only, outcomes are not awaited

use super::types::{ExtensionOutcome, ExtensionReport};
use crate::backup::BackupExtension;
use crate::store::PluginInstaller;
use log::debug;
use std::sync::Arc;

/// Requests installation of the extensions listed in a backup
pub struct ExtensionRestorer {
    installer: Arc<dyn PluginInstaller>,
}

impl ExtensionRestorer {
    pub fn new(installer: Arc<dyn PluginInstaller>) -> Self {
        Self { installer }
    }

    pub fn restore_extensions(&self, extensions: &[BackupExtension]) -> ExtensionReport {
        let mut report = ExtensionReport::default();
        for extension in extensions {
            match self.restore_one(extension) {
                ExtensionOutcome::Requested => report.requested += 1,
                ExtensionOutcome::AlreadyInstalled => report.already_installed += 1,
            }
        }
        report
    }

    fn restore_one(&self, extension: &BackupExtension) -> ExtensionOutcome {
        if self.installer.is_installed(&extension.pkg_name) {
            debug!("Extension {} already installed", extension.pkg_name);
            return ExtensionOutcome::AlreadyInstalled;
        }
        debug!("Requesting install of {}", extension.pkg_name);
        self.installer.request_install(extension.clone());
        ExtensionOutcome::Requested
    }
}
