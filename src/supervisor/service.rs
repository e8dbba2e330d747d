//! Service roles and launch specifications for the supervised group.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlimError};

/// Role tag of a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// FastCGI wrapper serving the cgit CGI
    Fcgi,
    /// Mirror sync daemon
    Sync,
    /// Web server fronting the FastCGI socket
    Web,
}

impl Role {
    /// Number of supervised roles
    pub const COUNT: usize = 3;

    /// Launch order: backends first, the web server last
    pub const START_ORDER: [Role; Role::COUNT] = [Role::Fcgi, Role::Sync, Role::Web];

    /// Termination order: reverse dependency order
    pub const SHUTDOWN_ORDER: [Role; Role::COUNT] = [Role::Web, Role::Sync, Role::Fcgi];

    /// Slot index of this role in fixed-size tables
    pub const fn index(self) -> usize {
        match self {
            Role::Fcgi => 0,
            Role::Sync => 1,
            Role::Web => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Fcgi => "fcgi",
            Role::Sync => "sync",
            Role::Web => "web",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executable path and trailing arguments used to launch one service.
///
/// The path doubles as argv[0], so `args` holds only what follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ServiceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Full argument vector, argv[0] included
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.path.display().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// One launch spec per role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTable {
    pub fcgi: ServiceSpec,
    pub sync: ServiceSpec,
    pub web: ServiceSpec,
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self {
            fcgi: ServiceSpec::new("/bin/fcgiwrap")
                .arg("-s")
                .arg("unix:/run/fcgiwrap.socket"),
            sync: ServiceSpec::new("/bin/mirror-sync"),
            web: ServiceSpec::new("/bin/nginx"),
        }
    }
}

impl ServiceTable {
    pub fn get(&self, role: Role) -> &ServiceSpec {
        match role {
            Role::Fcgi => &self.fcgi,
            Role::Sync => &self.sync,
            Role::Web => &self.web,
        }
    }

    /// Every service must be invoked by absolute path
    pub fn validate(&self) -> Result<()> {
        for role in Role::START_ORDER {
            let spec = self.get(role);
            if !spec.path.is_absolute() {
                return Err(SlimError::Config(format!(
                    "{} service path must be absolute: {}",
                    role,
                    spec.path.display()
                )));
            }
        }
        Ok(())
    }
}
