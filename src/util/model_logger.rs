use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::Local;
use serde::{Serialize, Deserialize};
use std::io::Write;

use crate::config::ExperimentConfig;
use crate::error::Result;
use crate::hourly::step_2_sequence_model::ModelKind;
use crate::hourly::step_4_train_model::TrainingReport;
use crate::hourly::step_5_evaluation::EvaluationReport;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExperimentRecord {
    pub timestamp: String,
    pub model_type: ModelKind,
    pub lookback: usize,
    pub hidden_size: usize,
    pub num_layers: usize,
    pub dropout: f64,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub seed: u64,
    pub epoch_losses: Vec<f64>,
    pub training_time_seconds: Option<f64>,
    pub evaluation_time_seconds: Option<f64>,
    pub smape_percent: Option<f64>,
    pub file_smape_percent: BTreeMap<String, f64>,
    pub notes: String,
}

impl ExperimentRecord {
    pub fn new(model_type: ModelKind, config: &ExperimentConfig) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            model_type,
            lookback: config.lookback,
            hidden_size: config.hidden_size,
            num_layers: config.num_layers,
            dropout: config.dropout,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            epochs: config.epochs,
            seed: config.seed,
            epoch_losses: Vec::new(),
            training_time_seconds: None,
            evaluation_time_seconds: None,
            smape_percent: None,
            file_smape_percent: BTreeMap::new(),
            notes: "".to_string(),
        }
    }

    pub fn set_training(&mut self, report: &TrainingReport) {
        self.epoch_losses = report.epochs.iter().map(|e| e.average_loss).collect();
        self.training_time_seconds = Some(report.total_secs);
    }

    pub fn set_evaluation(&mut self, report: &EvaluationReport) {
        self.smape_percent = Some(report.smape_percent());
        self.evaluation_time_seconds = Some(report.duration_secs);
        self.file_smape_percent = report
            .files
            .iter()
            .map(|(name, file)| (name.clone(), file.smape * 100.0))
            .collect();
        if report.guarded_terms > 0 {
            self.add_note(&format!(
                "{} sMAPE terms used a clamped denominator",
                report.guarded_terms
            ));
        }
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }

    pub fn save(&self, experiment_dir: &Path) -> Result<PathBuf> {
        // Create directory if it doesn't exist
        fs::create_dir_all(experiment_dir)?;

        let filename = format!(
            "{}_h{}_l{}_d{}_experiment.json",
            self.model_type.to_string().to_lowercase(),
            self.hidden_size,
            self.num_layers,
            (self.dropout * 100.0).round() as i32,
        );

        let file_path = experiment_dir.join(filename);

        // Serialize to JSON and save
        let json = serde_json::to_string_pretty(&self)?;
        let mut file = fs::File::create(&file_path)?;
        file.write_all(json.as_bytes())?;

        Ok(file_path)
    }
}

/// Creates a timestamped run directory under `base`
pub fn create_experiment_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(Local::now().format("%Y%m%d_%H%M%S").to_string());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hourly::step_4_train_model::EpochSummary;
    use crate::hourly::step_5_evaluation::FileForecast;

    #[test]
    fn test_record_save_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig::default();
        let mut record = ExperimentRecord::new(ModelKind::Gru, &config);

        record.set_training(&TrainingReport {
            model_kind: ModelKind::Gru,
            epochs: vec![EpochSummary {
                epoch: 1,
                average_loss: 0.05,
                duration_secs: 1.5,
            }],
            total_secs: 1.5,
        });

        let mut files = BTreeMap::new();
        files.insert(
            "AEP_hourly.csv".to_string(),
            FileForecast {
                predictions: vec![100.0],
                targets: vec![110.0],
                smape: 0.1,
            },
        );
        record.set_evaluation(&EvaluationReport {
            files,
            smape: 0.1,
            guarded_terms: 0,
            duration_secs: 0.2,
        });

        let path = record.save(dir.path()).unwrap();
        assert!(path.ends_with("gru_h256_l2_d20_experiment.json"));

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded: ExperimentRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.epoch_losses, vec![0.05]);
        assert_eq!(loaded.smape_percent, Some(10.0));
        assert_eq!(loaded.file_smape_percent.get("AEP_hourly.csv"), Some(&10.0));
    }
}
