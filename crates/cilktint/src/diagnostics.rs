use serde::Serialize;

/// What went sideways during an annotation pass. Anomalies are advisory:
/// the pass always completes and returns whatever output it built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    UnresolvedTypeSplit,
    ScopeStackUnderflow,
    UnbalancedScopeStack,
}

#[derive(Debug, Clone, Serialize)]
pub struct Anomaly {
    pub code: String,
    pub kind: AnomalyKind,
    pub message: String,
    /// 1-based input line, or 0 when the anomaly belongs to end of input.
    pub line: usize,
    pub content: String,
}

impl Anomaly {
    pub fn unresolved_type_split(line: usize, content: &str) -> Self {
        Anomaly {
            code: "W0001".to_string(),
            kind: AnomalyKind::UnresolvedTypeSplit,
            message: format!("no known type at the start of {:?}", content),
            line,
            content: content.to_string(),
        }
    }

    pub fn scope_stack_underflow(line: usize, content: &str) -> Self {
        Anomaly {
            code: "W0002".to_string(),
            kind: AnomalyKind::ScopeStackUnderflow,
            message: format!("scope pop past the base state at {:?}", content),
            line,
            content: content.to_string(),
        }
    }

    pub fn unbalanced_scope_stack(open_labels: &[&str]) -> Self {
        Anomaly {
            code: "W0003".to_string(),
            kind: AnomalyKind::UnbalancedScopeStack,
            message: format!(
                "scope stack not empty after the last token: [{}]",
                open_labels.join(", ")
            ),
            line: 0,
            content: String::new(),
        }
    }
}

pub fn render_anomalies(anomalies: &[Anomaly]) -> String {
    let mut output = String::new();
    for (index, anomaly) in anomalies.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&render_anomaly(anomaly));
    }
    output
}

pub fn render_anomaly(anomaly: &Anomaly) -> String {
    if anomaly.line == 0 {
        format!("warn[{}] {}", anomaly.code, anomaly.message)
    } else {
        format!("warn[{}] line {}: {}", anomaly.code, anomaly.line, anomaly.message)
    }
}
