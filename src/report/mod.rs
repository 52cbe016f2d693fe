use crate::detection::{BatchReport, DetectionResult};

const RULE_WIDTH: usize = 60;

fn banner(title: &str, width: usize) -> String {
    let rule = "=".repeat(width);
    format!("{rule}\n{title}\n{rule}\n")
}

pub fn render_result(image: &str, result: &DetectionResult) -> String {
    let mut out = format!("Analyzing: {}\n", image);
    out.push_str(&banner("DOCUMENT VERIFICATION RESULT", RULE_WIDTH));
    out.push_str(&format!("Prediction: {}\n", result.prediction()));
    out.push_str(&format!(
        "Authenticity Score: {:.2}%\n",
        result.authenticity_score()
    ));
    out.push_str(&format!("Threshold: {:.0}%\n", result.threshold()));

    if result.is_uncertain() {
        out.push_str("\nWARNING: Score near threshold - manual review recommended\n");
    }

    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    out
}

pub fn render_batch(report: &BatchReport) -> String {
    let width = RULE_WIDTH + 20;
    let mut out = banner("BATCH PREDICTION SUMMARY REPORT", width);

    out.push_str(&format!("Total Images: {}\n", report.total()));
    out.push_str(&format!(
        "Real Cards: {} ({:.1}%)\n",
        report.real_count(),
        report.real_percentage()
    ));
    out.push_str(&format!(
        "Fake Cards: {} ({:.1}%)\n",
        report.fake_count(),
        report.fake_percentage()
    ));
    out.push_str(&format!("Uncertain: {}\n", report.uncertain_count()));
    out.push_str(&format!("Average Score: {:.2}%\n", report.avg_score()));
    out.push_str(&"=".repeat(width));
    out.push('\n');

    if report.fake_count() > 0 {
        out.push_str("\nFAKE CARDS DETECTED:\n");
        for entry in report.fake_entries() {
            out.push_str(&format!(
                "  - {}: {:.2}%\n",
                entry.image_name(),
                entry.result().authenticity_score()
            ));
        }
    }

    if !report.skipped().is_empty() {
        out.push_str(&format!("\nSKIPPED ({}):\n", report.skipped().len()));
        for skipped in report.skipped() {
            out.push_str(&format!("  - {}: {}\n", skipped.image_name, skipped.reason));
        }
    }

    out
}

/// Training-set composition, printed before a training run.
pub fn render_training_summary(real: usize, fake: usize) -> String {
    let total = real + fake;
    let pct = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64 * 100.0
        }
    };

    let mut out = banner("TRAINING DATA SUMMARY", RULE_WIDTH);
    out.push_str(&format!("Total Images: {}\n", total));
    out.push_str(&format!("Real Images: {} ({:.1}%)\n", real, pct(real)));
    out.push_str(&format!("Fake Images: {} ({:.1}%)\n", fake, pct(fake)));
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::detection::{BatchEntry, SkippedImage};

    #[test]
    fn test_render_result_flags_uncertain_scores() {
        let uncertain = render_result("x.png", &DetectionResult::from_probability(0.42, 0.5));
        assert!(uncertain.contains("Prediction: FAKE"));
        assert!(uncertain.contains("Authenticity Score: 42.00%"));
        assert!(uncertain.contains("Threshold: 50%"));
        assert!(uncertain.contains("manual review"));

        let confident = render_result("x.png", &DetectionResult::from_probability(0.95, 0.5));
        assert!(!confident.contains("manual review"));
    }

    #[test]
    fn test_render_batch_lists_fakes_in_order() {
        let entries = vec![
            BatchEntry::new(&PathBuf::from("z.png"), DetectionResult::from_probability(0.1, 0.5)),
            BatchEntry::new(&PathBuf::from("m.png"), DetectionResult::from_probability(0.8, 0.5)),
            BatchEntry::new(&PathBuf::from("a.png"), DetectionResult::from_probability(0.3, 0.5)),
        ];
        let skipped = vec![SkippedImage {
            image_name: "bad.jpg".into(),
            reason: "cannot decode".into(),
        }];
        let text = render_batch(&BatchReport::from_entries(entries, skipped));

        assert!(text.contains("Total Images: 3"));
        assert!(text.contains("Fake Cards: 2 (66.7%)"));
        let z = text.find("z.png: 10.00%").unwrap();
        let a = text.find("a.png: 30.00%").unwrap();
        assert!(z < a);
        assert!(!text.contains("m.png"));
        assert!(text.contains("bad.jpg: cannot decode"));
    }

    #[test]
    fn test_render_result_layout() {
        let text = render_result("card.png", &DetectionResult::from_probability(0.95, 0.5));
        let lines = text.lines().collect::<Vec<_>>();
        let rule = "=".repeat(RULE_WIDTH);
        assert_eq!(lines[0], "Analyzing: card.png");
        assert_eq!(lines[1], rule);
        assert_eq!(lines[2], "DOCUMENT VERIFICATION RESULT");
        assert_eq!(lines[3], rule);
        assert_eq!(lines.last(), Some(&rule.as_str()));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_training_summary_handles_empty_sets() {
        assert!(render_training_summary(0, 0).contains("Real Images: 0 (0.0%)"));
        assert!(render_training_summary(3, 1).contains("Real Images: 3 (75.0%)"));
    }
}
