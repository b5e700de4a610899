//! File locations, raw report readers and output writers.

/// CSV writers for the output series.
pub mod export;
/// Readers for the public IESO report layouts.
pub mod ieso;
pub mod tables;

use std::path::{Path, PathBuf};

/// Locations of the raw reports for one year under `<data_dir>/IESO/<year>/`.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    root: PathBuf,
    year: i32,
}

impl ReportPaths {
    pub fn new(data_dir: &Path, year: i32) -> Self {
        Self {
            root: data_dir.join("IESO").join(year.to_string()),
            year,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Monthly generator output report, `month` in `1..=12`.
    pub fn generator_month(&self, month: u32) -> PathBuf {
        self.root.join("Generator").join(format!(
            "PUB_GenOutputCapabilityMonth_{}{month:02}.csv",
            self.year
        ))
    }

    pub fn demand(&self) -> PathBuf {
        self.root
            .join("Demand")
            .join(format!("PUB_Demand_{}.csv", self.year))
    }

    pub fn intertie(&self) -> PathBuf {
        self.root
            .join("Trade")
            .join(format!("PUB_IntertieScheduleFlowYear_{}.csv", self.year))
    }
}

/// Output series locations for one year.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub supply: PathBuf,
    pub consumption: PathBuf,
    pub spot_check: PathBuf,
}

impl OutputPaths {
    pub fn new(output_dir: &Path, year: i32) -> Self {
        Self {
            supply: output_dir.join(format!("Supply-based_EF_{year}.csv")),
            consumption: output_dir.join(format!("Consumption-based_EF_{year}.csv")),
            spot_check: output_dir.join(format!("Spot_Check_Data_{year}.csv")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_paths_follow_ieso_layout() {
        let p = ReportPaths::new(Path::new("data"), 2021);
        assert_eq!(
            p.generator_month(3),
            PathBuf::from("data/IESO/2021/Generator/PUB_GenOutputCapabilityMonth_202103.csv")
        );
        assert_eq!(
            p.demand(),
            PathBuf::from("data/IESO/2021/Demand/PUB_Demand_2021.csv")
        );
        assert_eq!(
            p.intertie(),
            PathBuf::from("data/IESO/2021/Trade/PUB_IntertieScheduleFlowYear_2021.csv")
        );
    }

    #[test]
    fn output_paths_are_named_by_year() {
        let o = OutputPaths::new(Path::new("out"), 2020);
        assert_eq!(o.consumption, PathBuf::from("out/Consumption-based_EF_2020.csv"));
        assert_eq!(o.supply, PathBuf::from("out/Supply-based_EF_2020.csv"));
        assert_eq!(o.spot_check, PathBuf::from("out/Spot_Check_Data_2020.csv"));
    }
}
