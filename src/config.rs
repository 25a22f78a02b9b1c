//! Job configuration: defaults, an optional JSON job file, then command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{cli::Cli, engine::{Fallback, Tolerance}, io::json::read_json};

/// Settings shared by every command of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Two-digit state FIPS code.
    pub state: String,
    /// Data year, e.g. 2019 for the 2015-2019 ACS.
    pub year: u16,
    /// Directory relative geometry paths are resolved against.
    pub geo_root: PathBuf,
    /// Directory relative table paths are resolved against.
    pub demo_root: PathBuf,
    /// Property holding the GEOID in geometry files and tables.
    pub id_property: String,
    pub fallback: Fallback,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            state: "55".into(),
            year: 2019,
            geo_root: PathBuf::from("./data/geometries"),
            demo_root: PathBuf::from("./data/demographics"),
            id_property: "GEOID".into(),
            fallback: Fallback::Drop,
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl JobConfig {
    /// Build the configuration for a run: the job file named by `--config`
    /// (if any) over the defaults, then any global flags over that.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => read_json::<JobConfig>(path)
                .with_context(|| format!("[config] Failed to load job file {}", path.display()))?,
            None => JobConfig::default(),
        };

        if let Some(state) = &cli.state { config.state = state.clone() }
        if let Some(year) = cli.year { config.year = year }
        if let Some(root) = &cli.geo_root { config.geo_root = root.clone() }
        if let Some(root) = &cli.demo_root { config.demo_root = root.clone() }

        config.normalize()?;
        Ok(config)
    }

    /// Zero-pad the state code and check ranges.
    pub fn normalize(&mut self) -> Result<()> {
        let state = self.state.trim();
        ensure!(
            !state.is_empty() && state.len() <= 2 && state.bytes().all(|b| b.is_ascii_digit()),
            "[config] state must be a FIPS code such as 27 or 05, got {:?}", self.state
        );
        self.state = format!("{state:0>2}");
        ensure!((1990..=2100).contains(&self.year), "[config] implausible year {}", self.year);
        ensure!(self.rtol >= 0.0 && self.atol >= 0.0, "[config] tolerances must be non-negative");
        Ok(())
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance { rtol: self.rtol, atol: self.atol }
    }

    /// Resolve a geometry path: relative paths are taken under `geo_root`
    /// unless they already exist as given.
    pub fn geo_path(&self, path: &Path) -> PathBuf {
        resolve(&self.geo_root, path)
    }

    /// Resolve a table path against `demo_root`.
    pub fn demo_path(&self, path: &Path) -> PathBuf {
        resolve(&self.demo_root, path)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn flags_override_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("job.json");
        std::fs::write(&job, r#"{ "state": "27", "year": 2018, "fallback": "nearest" }"#).unwrap();

        let cli = Cli::parse_from([
            "apportion", "--config", job.to_str().unwrap(), "--year", "2019",
            "describe", "in.geojson", "-o", "out.csv",
        ]);
        let config = JobConfig::load(&cli).unwrap();

        assert_eq!(config.state, "27");
        assert_eq!(config.year, 2019);
        assert_eq!(config.fallback, Fallback::Nearest);
        assert_eq!(config.id_property, "GEOID");
    }

    #[test]
    fn state_is_zero_padded_and_checked() {
        let mut config = JobConfig { state: "5".into(), ..Default::default() };
        config.normalize().unwrap();
        assert_eq!(config.state, "05");

        let mut config = JobConfig { state: "MN".into(), ..Default::default() };
        assert!(config.normalize().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<JobConfig>(r#"{ "stat": "27" }"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn relative_paths_resolve_under_roots() {
        let config = JobConfig { geo_root: "/data/geo".into(), ..Default::default() };
        assert_eq!(config.geo_path(Path::new("no-such-file.geojson")), PathBuf::from("/data/geo/no-such-file.geojson"));
        assert_eq!(config.geo_path(Path::new("/abs/x.geojson")), PathBuf::from("/abs/x.geojson"));
    }
}
