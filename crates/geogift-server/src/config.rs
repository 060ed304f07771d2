use anyhow::{Context, Result, bail};

use geogift_unlock::geo::RadiusLimits;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub radius_limits: RadiusLimits,
    /// Year stamped into generated claim codes.
    pub claim_year: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = var_or("GEOGIFT_HOST", "0.0.0.0");
        let port: u16 = var_or("GEOGIFT_PORT", "3000")
            .parse()
            .context("GEOGIFT_PORT must be a port number")?;
        let min_m: u32 = var_or("GEOGIFT_MIN_RADIUS_M", "5")
            .parse()
            .context("GEOGIFT_MIN_RADIUS_M must be a whole number of meters")?;
        let max_m: u32 = var_or("GEOGIFT_MAX_RADIUS_M", "1000")
            .parse()
            .context("GEOGIFT_MAX_RADIUS_M must be a whole number of meters")?;
        if min_m == 0 || min_m > max_m {
            bail!("GPS radius range {}..={} m is empty or starts at zero", min_m, max_m);
        }
        let claim_year = var_or("GEOGIFT_CLAIM_YEAR", "2025");

        Ok(Self {
            host,
            port,
            radius_limits: RadiusLimits { min_m, max_m },
            claim_year,
        })
    }
}
