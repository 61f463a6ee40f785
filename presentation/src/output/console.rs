//! Console output formatter for council results

use super::formatter::OutputFormatter;
use super::report::CouncilReport;
use colored::Colorize;
use council_domain::{ExecutionTask, TaskStatus};

const SUMMARY_WIDTH: usize = 60;

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete council result
    pub fn format(report: &CouncilReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Agent Council Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n",
            "Question:".cyan().bold(),
            report.question
        ));
        if let Some(council) = &report.council {
            output.push_str(&format!("{} {}\n", "Council:".cyan().bold(), council));
        }
        output.push_str(&format!(
            "{} {}\n",
            "Session:".cyan().bold(),
            report.session_id
        ));

        output.push_str(&Self::section_header("Proposals"));
        output.push_str(&Self::results_table(report));

        for task in report.results.iter().filter(|t| t.is_done()) {
            if let Some(response) = task.response() {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── #{} {} ──", task.proposal_id, task.agent_name())
                        .yellow()
                        .bold(),
                    response.trim()
                ));
            }
        }

        if !report.reviews.is_empty() {
            output.push_str(&Self::section_header("Peer Reviews"));
            for (id, score) in &report.scores {
                output.push_str(&format!(
                    "\n{} mean {:.2} from {} review(s)\n",
                    format!("Proposal #{}", id).yellow().bold(),
                    score.mean(),
                    score.count()
                ));
                for comment in &score.comments {
                    output.push_str(&format!("  * {}\n", comment));
                }
            }
            for review in report.reviews.iter().filter(|r| !r.is_done()) {
                let reason = review
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                output.push_str(&format!(
                    "\n{} {}\n",
                    format!("{} failed:", review.reviewer).red().bold(),
                    reason
                ));
            }
        }

        output.push_str(&Self::section_header("Chairman Verdict"));
        match &report.verdict {
            Some(verdict) => output.push_str(&format!("\n{}\n", verdict.trim())),
            None => output.push_str(&format!("\n{}\n", "(no verdict)".dimmed())),
        }

        if !report.errors.is_empty() {
            output.push_str(&format!("\n{}\n", "Errors:".red().bold()));
            for error in &report.errors {
                output.push_str(&format!("  * {}\n", error));
            }
        }

        output.push_str(&Self::cost_line(report));
        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &CouncilReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the verdict only
    pub fn format_verdict_only(report: &CouncilReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Agent Council Verdict ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), report.question));

        let agents: Vec<&str> = report.results.iter().map(ExecutionTask::agent_name).collect();
        if !agents.is_empty() {
            output.push_str(&format!(
                "{} {}\n\n",
                "Agents consulted:".dimmed(),
                agents.join(", ")
            ));
        }

        output.push_str(report.verdict.as_deref().unwrap_or("(no verdict)").trim());
        output.push('\n');
        output
    }

    /// One row per proposal, ascending by id
    pub fn results_table(report: &CouncilReport) -> String {
        let mut rows = vec![format!(
            "{:<4} {:<20} {:<8} {:>6}  {}",
            "#", "Agent", "Status", "Score", "Summary"
        )];
        rows.push("-".repeat(44 + SUMMARY_WIDTH));

        let mut tasks: Vec<&ExecutionTask> = report.results.iter().collect();
        tasks.sort_by_key(|t| t.proposal_id);

        for task in tasks {
            let score = report
                .mean_score(task.proposal_id)
                .map(|m| format!("{:.2}", m))
                .unwrap_or_else(|| "-".to_string());
            let summary = match (&task.result, &task.error) {
                (Some(result), _) => result.summary.clone(),
                (None, Some(error)) => error.to_string(),
                (None, None) => String::new(),
            };
            let status = match task.status {
                TaskStatus::Done => task.status.as_str().green(),
                TaskStatus::Failed => task.status.as_str().red(),
                _ => task.status.as_str().normal(),
            };
            rows.push(format!(
                "{:<4} {:<20} {:<8} {:>6}  {}",
                task.proposal_id.index(),
                clip(task.agent_name(), 20),
                status,
                score,
                clip(&summary, SUMMARY_WIDTH)
            ));
        }
        rows.join("\n") + "\n"
    }

    fn cost_line(report: &CouncilReport) -> String {
        format!(
            "\n{} {} calls, {} tokens, ${:.4}\n",
            "Cost:".dimmed(),
            report.cost.calls,
            report.cost.total_tokens,
            report.cost.total_cost_usd
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

fn clip(text: &str, width: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= width {
        return line.to_string();
    }
    let kept: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &CouncilReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &CouncilReport) -> String {
        Self::format_json(report)
    }

    fn format_verdict_only(&self, report: &CouncilReport) -> String {
        Self::format_verdict_only(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{
        AgentSpec, AggregatedScore, CostTotals, CouncilPhase, FailureKind, ProposalId, Score,
        SessionId, TaskFailure, TaskOutcome, TaskResult, TokenUsage,
    };
    use std::collections::BTreeMap;

    fn report() -> CouncilReport {
        let done = ExecutionTask::settled(
            ProposalId::new(0),
            AgentSpec::new("Pragmatist", "ships"),
            TaskOutcome::Success(TaskResult {
                response: "TLDR: do it\n\nBecause.".into(),
                summary: "do it".into(),
                tools_used: Vec::new(),
                usage: TokenUsage::new(10, 5),
            }),
        );
        let failed = ExecutionTask::settled(
            ProposalId::new(1),
            AgentSpec::new("Skeptic", "doubts"),
            TaskOutcome::Failure(TaskFailure::new(FailureKind::Timeout, "timed out")),
        );

        let mut scores = BTreeMap::new();
        scores.insert(
            ProposalId::new(0),
            AggregatedScore {
                scores: vec![Score::clamped(4.0), Score::clamped(5.0), Score::clamped(4.0)],
                comments: vec!["solid".into()],
            },
        );

        CouncilReport {
            session_id: SessionId::new("session_x"),
            question: "Ship on Friday?".into(),
            council: Some("board".into()),
            phase: CouncilPhase::Complete,
            // Deliberately out of order
            results: vec![failed, done],
            reviews: Vec::new(),
            scores,
            verdict: Some("Ship on Monday.".into()),
            errors: Vec::new(),
            cost: CostTotals::default(),
        }
    }

    #[test]
    fn test_results_table_orders_by_id_with_two_decimal_means() {
        colored::control::set_override(false);
        let table = ConsoleFormatter::results_table(&report());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[2].starts_with("0"));
        assert!(lines[2].contains("Pragmatist"));
        assert!(lines[2].contains("4.33"));
        assert!(lines[3].starts_with("1"));
        assert!(lines[3].contains("failed"));
        assert!(lines[3].contains(" -  "));
    }

    #[test]
    fn test_verdict_only() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_verdict_only(&report());
        assert!(text.contains("Ship on Monday."));
        assert!(text.contains("Skeptic, Pragmatist"));
        assert!(!text.contains("Proposals"));
    }

    #[test]
    fn test_json_is_valid() {
        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&report())).unwrap();
        assert_eq!(value["verdict"], "Ship on Monday.");
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["phase"], "complete");
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a much longer line", 10), "a much ...");
        assert_eq!(clip("first\nsecond", 20), "first");
    }
}
