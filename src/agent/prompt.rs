use crate::history::FailureRecord;

const TOOL_GUIDANCE: &str = "[도구 사용 지침]: 주문, 고객, 상품, Q&A, 리뷰 등 실제 데이터가 필요한 경우에만 \
제공된 도구를 호출하세요. 도구 결과에 없는 사실은 추측하지 말고, 도구가 오류를 반환하면 \
고객에게 필요한 정보를 정중히 요청하세요.";

const MISSING_RESOLUTION: &str = "(상담원 해결책 미기록)";

/// Retrieved knowledge, in retrieval order.
pub fn build_context_block(documents: &[String]) -> String {
    documents.join("\n")
}

/// Prior failures for this customer that the model must not repeat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionDirective {
    entries: Vec<FailureRecord>,
}

impl CorrectionDirective {
    /// Keeps at most `limit` entries, in the order given (most recent first).
    pub fn from_failures(mut failures: Vec<FailureRecord>, limit: usize) -> Self {
        failures.truncate(limit);
        Self { entries: failures }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FailureRecord] {
        &self.entries
    }

    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }

        let mut text = String::from("--- 경고: 이전 실패 기록 발견 (최우선 지침) ---\n");
        for entry in &self.entries {
            text.push_str(&format!(
                "이전 문의: \"{}\". AI는 \"{}\"라고 답했으나, 최종적으로 \"{}\"이(가) 정답이었습니다. 이 지침을 최우선으로 따르십시오.\n",
                entry.input_text,
                entry.failed_answer,
                entry.final_resolution.as_deref().unwrap_or(MISSING_RESOLUTION),
            ));
        }
        text
    }
}

pub fn build_system_prompt(persona: &str, context_block: &str, directive: &CorrectionDirective) -> String {
    let mut prompt = format!(
        "{}\n아래 CS 정책 및 매뉴얼과 교정 지침을 최우선으로 참고하여 고객 문의에 답변하세요.\n[CS 정책 및 매뉴얼]:\n{}\n",
        persona, context_block
    );
    if !directive.is_empty() {
        prompt.push_str(&directive.render());
    }
    prompt.push_str(TOOL_GUIDANCE);
    prompt
}
