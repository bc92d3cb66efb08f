//! Server options.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COOKIE_NAME: &str = "scenario-mock-server";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerOptions {
    pub port: u16,
    pub host: String,
    /// `PUT` here with `{scenarioId}` selects a scenario
    pub select_scenario_path: String,
    /// `GET` here lists the scenarios
    pub scenarios_path: String,
    /// Keep the session pair in a per-client cookie instead of server memory
    pub cookie_mode: bool,
    pub cookie_name: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
            select_scenario_path: "/select-scenario".to_string(),
            scenarios_path: "/scenarios".to_string(),
            cookie_mode: false,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

impl ServerOptions {
    pub fn with_cookie_mode(mut self, cookie_mode: bool) -> Self {
        self.cookie_mode = cookie_mode;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ServerOptions::default();
        assert_eq!(options.port, 3000);
        assert_eq!(options.select_scenario_path, "/select-scenario");
        assert_eq!(options.scenarios_path, "/scenarios");
        assert!(!options.cookie_mode);
        assert_eq!(options.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options: ServerOptions =
            serde_yaml::from_str("port: 4000\ncookieMode: true\n").unwrap();
        assert_eq!(options.port, 4000);
        assert!(options.cookie_mode);
        assert_eq!(options.cookie_name, DEFAULT_COOKIE_NAME);
        assert_eq!(options.host, "0.0.0.0");
    }
}
