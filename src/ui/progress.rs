use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::campaign::{Campaign, CampaignStatus, ConversationMessage, MessageKind};
use crate::phase::Phase;
use crate::ui::icons::{CHECK, CROSS, PAUSE, PIVOT, REVIEW, SPARKLE, SPEECH, WARN};

/// Terminal view of one campaign, rendered with `indicatif`.
///
/// A phase bar tracks stored results and a spinner shows the live status.
/// New conversation messages are printed above the bars as they arrive.
pub struct CampaignUI {
    multi: MultiProgress,
    phase_bar: ProgressBar,
    status_bar: ProgressBar,
    verbose: bool,
    printed: AtomicUsize,
}

impl CampaignUI {
    pub fn new(verbose: bool) -> Self {
        let multi = MultiProgress::new();

        let phase_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");
        let phase_bar = multi.add(ProgressBar::new(Phase::WORK.len() as u64));
        phase_bar.set_style(phase_style);
        phase_bar.set_prefix("Phases");

        let status_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");
        let status_bar = multi.add(ProgressBar::new_spinner());
        status_bar.set_style(status_style);
        status_bar.set_prefix("Status");
        status_bar.enable_steady_tick(Duration::from_millis(100));

        Self {
            multi,
            phase_bar,
            status_bar,
            verbose,
            printed: AtomicUsize::new(0),
        }
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        // A hidden draw target (no terminal) swallows println.
        if self.multi.is_hidden() {
            println!("{}", msg.as_ref());
        } else if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    /// Print messages not yet shown and refresh both bars.
    pub fn update(&self, campaign: &Campaign) {
        let already = self.printed.load(Ordering::SeqCst);
        // Processing markers are removed once a phase lands, which can shrink
        // the conversation; only count messages that are kept.
        let visible: Vec<&ConversationMessage> = campaign
            .conversation
            .iter()
            .filter(|m| m.kind != MessageKind::Processing)
            .collect();
        for message in visible.iter().skip(already) {
            self.print_message(message);
        }
        self.printed.store(visible.len().max(already), Ordering::SeqCst);

        self.phase_bar.set_position(campaign.phases.len() as u64);
        self.phase_bar
            .set_message(match campaign.last_completed_phase() {
                Some(phase) => format!("last: {}", style(phase.title()).yellow()),
                None => String::new(),
            });
        self.status_bar.set_message(status_line(campaign));
    }

    fn print_message(&self, message: &ConversationMessage) {
        let line = match message.kind {
            MessageKind::Brief => format!(
                "{} {} {}",
                SPEECH,
                style("Brief:").bold(),
                message.message
            ),
            MessageKind::Deliverable => {
                let score = message
                    .quality_score
                    .map(|s| format!(" {}", style(format!("(confidence {:.0}%)", s * 100.0)).dim()))
                    .unwrap_or_default();
                let mut line = format!(
                    "{} {}{}\n    {}",
                    CHECK,
                    style(&message.speaker).green().bold(),
                    score,
                    message.message.replace('\n', "\n    ")
                );
                if self.verbose
                    && let Some(deliverable) = &message.deliverable
                    && let Ok(json) = serde_json::to_string_pretty(deliverable)
                {
                    line.push_str(&format!("\n{}", style(json).dim()));
                }
                line
            }
            MessageKind::Review => format!("{} {}", REVIEW, style(&message.message).cyan()),
            MessageKind::Refinement => format!(
                "{} {} {}",
                PIVOT,
                style("Refinement:").bold(),
                message.message
            ),
            MessageKind::System => format!(
                "{} {}",
                style("·").dim(),
                style(&message.message).dim()
            ),
            MessageKind::Processing => return,
        };
        self.print_line(line);
    }

    /// Stop the bars and print the final state.
    pub fn finish(&self, campaign: &Campaign) {
        self.update(campaign);
        self.status_bar.finish_and_clear();
        match campaign.status {
            CampaignStatus::Completed => {
                self.phase_bar.finish_with_message("done");
                self.print_line(format!(
                    "\n{} {} {}",
                    SPARKLE,
                    style("Campaign complete:").green().bold(),
                    campaign.id
                ));
            }
            CampaignStatus::Failed => {
                self.phase_bar.abandon_with_message("failed");
                self.print_line(format!(
                    "\n{} {} {}",
                    CROSS,
                    style("Campaign failed:").red().bold(),
                    campaign.error.as_deref().unwrap_or("unknown error")
                ));
            }
            CampaignStatus::Cancelled => {
                self.phase_bar.abandon_with_message("cancelled");
                self.print_line(format!("\n{} {}", WARN, style("Campaign cancelled").yellow()));
            }
            _ => {
                self.phase_bar.abandon();
                self.print_line(format!(
                    "\n{} Campaign {} left {}",
                    PAUSE, campaign.id, campaign.status
                ));
            }
        }
    }

    /// Run `f` with the bars hidden, for interactive prompts.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }
}

fn status_line(campaign: &Campaign) -> String {
    match campaign.status {
        CampaignStatus::Running(phase) => format!(
            "{} working on {}",
            style(phase.agent_name()).cyan(),
            phase.title()
        ),
        CampaignStatus::Paused => format!(
            "{} waiting for review of {}",
            PAUSE,
            campaign.awaiting_review.map(|p| p.title()).unwrap_or("?")
        ),
        status => status.to_string(),
    }
}
