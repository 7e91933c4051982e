//! # Campus CLI
//!
//! Loads configuration, seeds an in-process document store from a JSON
//! fixture, and applies one registration command against it.
//!
//! ## Example
//! ```no_run
//! use campus::domain::config::AppConfig;
//! use campus_cli::{App, args::Command};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new(AppConfig::default())?;
//!     let report = app.execute(&Command::Parse { schedule: "2-4 | 1-3 | A1".into() }).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod args;
mod fixture;

pub use fixture::Fixture;

use crate::args::{Command, RequestArgs};
use anyhow::{Context, Result};
use campus::database::{Database, DatabaseBuilder, DocumentRef, DocumentStore};
use campus::domain::config::AppConfig;
use campus::domain::constants::SECTIONS;
use campus::domain::constants::section::{CURRENT_SLOTS, MAX_SLOTS};
use campus::domain::registry::{self, InitializedSlice};
use campus::features::enrollment::schedule::ScheduleText;
use campus::features::enrollment::{
    ClassSection, Enrollment, LooseText, ParsedSchedule, RegistrationRequest,
};
use serde_json::{Value, json};
use tracing::info;

/// A store handle plus the feature slices registered over it.
#[derive(Debug)]
pub struct App {
    database: Database,
    slices: Vec<InitializedSlice>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let database = DatabaseBuilder::from_config(&config.database)
            .name("campus")
            .init()
            .context("Failed to initialize document store")?;
        let slices = campus::init(&config, &database);
        info!(slices = slices.len(), "Feature slices initialized");
        Ok(Self { database, slices })
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }

    /// Loads fixture documents into the store.
    pub async fn seed(&self, fixture: &Fixture) -> Result<usize> {
        let written = fixture.apply(&self.database).await.context("Failed to seed fixture")?;
        info!(written, "Fixture loaded");
        Ok(written)
    }

    fn enrollment(&self) -> Result<&Enrollment> {
        registry::find::<Enrollment>(&self.slices).context("Enrollment feature is not enabled")
    }

    /// Runs one command and returns its JSON report.
    pub async fn execute(&self, command: &Command) -> Result<Value> {
        match command {
            Command::Register(args) => self.apply(args, true).await,
            Command::Unregister(args) => self.apply(args, false).await,
            Command::Parse { schedule } => Ok(parse_report(schedule)),
            Command::Roster { section } => {
                let roster = self.enrollment()?.catalog.roster(section).await?;
                Ok(json!({ "section": section, "count": roster.len(), "students": roster }))
            },
            Command::Sections { term } => {
                let sections = self.enrollment()?.catalog.sections_for_term(term).await?;
                let ids: Vec<_> = sections.into_iter().map(|(id, _)| id).collect();
                Ok(json!({ "term": term, "sections": ids }))
            },
        }
    }

    async fn apply(&self, args: &RequestArgs, register: bool) -> Result<Value> {
        let request = RegistrationRequest {
            student_id: args.student.clone(),
            section_id: args.section.clone(),
            term: args.term.clone(),
            register,
        };
        let outcome = self.enrollment()?.coordinator.apply(&request).await?;

        let reference = DocumentRef::new(SECTIONS, args.section.trim());
        let state = self.database.get(&reference).await?.map(|doc| {
            json!({
                "currentSlots": doc.get(CURRENT_SLOTS),
                "maxSlots": doc.get(MAX_SLOTS),
            })
        });
        info!(?outcome, section = %reference, ?state, "Command applied");
        Ok(json!({ "outcome": outcome, "section": args.section.trim(), "state": state }))
    }
}

fn parse_report(schedule: &str) -> Value {
    let section = ClassSection { schedule: Some(LooseText::from(schedule)), ..ClassSection::default() };
    let text = ScheduleText::of(&section);
    let parsed = ParsedSchedule::parse(&section);
    json!({
        "days": parsed.days,
        "periods": parsed.periods,
        "dates": parsed.dates.map(|range| range.to_string()),
        "source": { "days": text.days, "periods": text.periods, "dates": text.dates },
    })
}
