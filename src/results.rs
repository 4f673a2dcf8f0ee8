// --- File: results.rs ---
use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;

use crate::agent::AgentId;
use crate::utils::mean;

/// One exported line per spawned agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub simulation_id: u32,
    pub agent_id: AgentId,
    pub species: String,
    pub success_step: Option<u64>,
    pub patch_name: Option<u32>,
}

pub trait ResultSink {
    fn record(&mut self, row: &ResultRow) -> std::io::Result<()>;
}

/// Keeps every row in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub rows: Vec<ResultRow>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, row: &ResultRow) -> std::io::Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}

/// Newline-delimited JSON.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonLinesSink<W> {
    fn record(&mut self, row: &ResultRow) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, row)?;
        self.writer.write_all(b"\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesSummary {
    /// Ticks at which agents of this species arrived, in arrival order.
    pub success_steps: Vec<u64>,
    pub mean_success_step: Option<f64>,
}

/// Handed out once, when every agent has either arrived or starved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub simulation_id: u32,
    pub ticks: u64,
    pub successes: usize,
    /// Starvations of agents that never arrived; `successes + deaths` is
    /// at most the number of spawned agents.
    pub deaths: usize,
    /// Arrived agents that starved while resting. Already in `successes`.
    pub starved_after_arrival: usize,
    pub species: BTreeMap<String, SpeciesSummary>,
}

impl RunSummary {
    pub fn new(
        simulation_id: u32,
        ticks: u64,
        deaths: usize,
        starved_after_arrival: usize,
        success_log: &BTreeMap<String, Vec<u64>>,
    ) -> Self {
        let species = success_log
            .iter()
            .map(|(name, steps)| {
                let summary = SpeciesSummary {
                    success_steps: steps.clone(),
                    mean_success_step: mean(steps),
                };
                (name.clone(), summary)
            })
            .collect();
        Self {
            simulation_id,
            ticks,
            successes: success_log.values().map(Vec::len).sum(),
            deaths,
            starved_after_arrival,
            species,
        }
    }
}
