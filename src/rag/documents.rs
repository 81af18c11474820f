//! Turns relational records into knowledge documents.

use serde_json::json;

use super::store::{DocType, KnowledgeDocument};
use crate::commerce::{CsManual, Product, Qna, Review};

const NO_ANSWER_YET: &str = "아직 답변이 없습니다.";

pub fn manual_documents(manuals: &[CsManual]) -> Vec<KnowledgeDocument> {
    manuals
        .iter()
        .map(|m| {
            KnowledgeDocument::new(
                &m.manual_id,
                &m.content,
                DocType::Manual,
                json!({ "domain": m.domain, "urgency": m.urgency }),
            )
        })
        .collect()
}

pub fn product_documents(products: &[Product]) -> Vec<KnowledgeDocument> {
    products
        .iter()
        .map(|p| {
            KnowledgeDocument::new(
                format!("prod_{}", p.product_no),
                format!("상품명: {}, 카테고리: {}", p.product_name, p.category_name),
                DocType::Product,
                json!({ "product_no": p.product_no }),
            )
        })
        .collect()
}

pub fn qna_documents(qnas: &[Qna]) -> Vec<KnowledgeDocument> {
    qnas.iter()
        .map(|q| {
            KnowledgeDocument::new(
                &q.question_id,
                format!(
                    "질문: {}, 답변: {}",
                    q.question_text,
                    q.answer_text.as_deref().unwrap_or(NO_ANSWER_YET)
                ),
                DocType::Qna,
                json!({ "product_no": q.product_no, "is_answered": q.is_answered }),
            )
        })
        .collect()
}

pub fn review_documents(reviews: &[Review]) -> Vec<KnowledgeDocument> {
    reviews
        .iter()
        .map(|r| {
            KnowledgeDocument::new(
                &r.review_id,
                &r.review_text,
                DocType::Review,
                json!({ "product_id": r.product_id, "rating": r.rating }),
            )
        })
        .collect()
}

/// A Q&A fragment synthesized from a corrected failure log.
pub fn learned_cs_document(log_id: &str, fragment: &str) -> KnowledgeDocument {
    KnowledgeDocument::new(
        format!("learned-cs-{}", log_id),
        fragment,
        DocType::LearnedCs,
        json!({ "domain": "learned-cs", "urgency": "medium", "log_id": log_id }),
    )
}

/// A Q&A fragment anticipating questions raised by a negative review.
pub fn learned_review_document(review_id: &str, category: &str, fragment: &str) -> KnowledgeDocument {
    KnowledgeDocument::new(
        format!("learned-review-{}", review_id),
        fragment,
        DocType::LearnedReview,
        json!({
            "domain": "learned-review",
            "urgency": "medium",
            "review_id": review_id,
            "category": category,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commerce::fixtures::sample_snapshot;

    #[test]
    fn products_get_prefixed_ids_and_product_no() {
        let docs = product_documents(&sample_snapshot().products);
        assert_eq!(docs[0].id, "prod_1000001");
        assert_eq!(docs[0].text, "상품명: 순살 왕갈비탕 밀키트 650g, 카테고리: 한식/탕류");
        assert_eq!(docs[0].metadata["product_no"], 1000001);
    }

    #[test]
    fn unanswered_qna_uses_placeholder_answer() {
        let docs = qna_documents(&sample_snapshot().qnas);
        let pending = docs.iter().find(|d| d.id == "QNA-2003").unwrap();
        assert!(pending.text.ends_with("답변: 아직 답변이 없습니다."));
        assert_eq!(pending.metadata["is_answered"], false);
    }

    #[test]
    fn manuals_and_reviews_carry_metadata() {
        let snapshot = sample_snapshot();
        let manuals = manual_documents(&snapshot.manuals);
        assert_eq!(manuals[0].metadata["domain"], "배송");
        assert_eq!(manuals[0].metadata["urgency"], "medium");

        let reviews = review_documents(&snapshot.reviews);
        assert_eq!(reviews[1].metadata["product_id"], 1000016);
        assert_eq!(reviews[1].metadata["rating"], 1);
        assert_eq!(reviews[1].doc_type, DocType::Review);
    }

    #[test]
    fn learned_ids_are_derived_from_source() {
        assert_eq!(learned_cs_document("abc", "Q: A:").id, "learned-cs-abc");
        let doc = learned_review_document("REV-1", "배송 불만", "Q: A:");
        assert_eq!(doc.id, "learned-review-REV-1");
        assert_eq!(doc.doc_type, DocType::LearnedReview);
    }
}
