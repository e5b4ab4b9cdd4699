use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::input::{InputEvent, SPACE_BAR};
use super::remote::RemoteMessage;
use crate::render::canvas::{frame_len, MAX_DIMENSION};

#[derive(Clone, Debug, PartialEq)]
pub enum ScriptAction {
    Input(InputEvent),
    Remote(RemoteMessage),
    /// Out-of-band canvas resize, like a window resize on the page.
    Resize { width: u32, height: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedEvent {
    /// Host clock time in seconds at which the event is delivered.
    pub at: f64,
    pub action: ScriptAction,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptLine {
    at: f64,
    #[serde(default)]
    key: Option<u32>,
    #[serde(default)]
    click: bool,
    #[serde(default)]
    remote: Option<RemoteMessage>,
    #[serde(default)]
    resize: Option<[u32; 2]>,
}

fn check_time(at: f64) -> Result<()> {
    if !at.is_finite() || at < 0.0 {
        anyhow::bail!("event time must be a non-negative number, got {}", at);
    }
    Ok(())
}

impl ScriptLine {
    fn into_event(self) -> Result<ScriptedEvent> {
        check_time(self.at)?;
        let mut actions = Vec::new();
        if let Some(code) = self.key {
            actions.push(ScriptAction::Input(InputEvent::Key(code)));
        }
        if self.click {
            actions.push(ScriptAction::Input(InputEvent::ButtonClick));
        }
        if let Some(msg) = self.remote {
            actions.push(ScriptAction::Remote(msg));
        }
        if let Some([width, height]) = self.resize {
            if frame_len(width, height).is_none() {
                anyhow::bail!(
                    "resize must be between 1x1 and {}x{}, got {}x{}",
                    MAX_DIMENSION,
                    MAX_DIMENSION,
                    width,
                    height
                );
            }
            actions.push(ScriptAction::Resize { width, height });
        }
        if actions.len() != 1 {
            anyhow::bail!("expected exactly one of key, click, remote or resize");
        }
        Ok(ScriptedEvent {
            at: self.at,
            action: actions.remove(0),
        })
    }
}

/// Timed inputs and remote messages replayed against the host clock.
#[derive(Debug, Default)]
pub struct Script {
    events: Vec<ScriptedEvent>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// One JSON object per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut script = Self::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let raw: ScriptLine = serde_json::from_str(line)
                .with_context(|| format!("Invalid script line {}", idx + 1))?;
            let event = raw
                .into_event()
                .with_context(|| format!("Invalid script line {}", idx + 1))?;
            script.push(event);
        }
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn push(&mut self, event: ScriptedEvent) {
        // Stable insert keeps same-time events in file order.
        let idx = self.events.partition_point(|e| e.at <= event.at);
        self.events.insert(idx, event);
    }

    /// Space bar presses at each of the given times. Nothing is added if
    /// any time is negative or not a number.
    pub fn add_toggles(&mut self, times: &[f64]) -> Result<()> {
        for &at in times {
            check_time(at).context("Invalid toggle time")?;
        }
        for &at in times {
            self.push(ScriptedEvent {
                at,
                action: ScriptAction::Input(InputEvent::Key(SPACE_BAR)),
            });
        }
        Ok(())
    }

    pub fn resizes_canvas(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e.action, ScriptAction::Resize { .. }))
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Remove and return every event due at or before `now`.
    pub fn take_due(&mut self, now: f64) -> Vec<ScriptAction> {
        let split = self.events.partition_point(|e| e.at <= now);
        self.events.drain(..split).map(|e| e.action).collect()
    }
}
