//! End-to-end: patient data to a scored assessment through the queue.

use std::time::Duration;

use dili_core::{ClassifierOptions, classify_patient};
use dili_model::{ConceptId, GradePoint, IciAllowList, PatientDrugData, ToxicityReference};
use dili_naranjo::{
    NaranjoCategory, NaranjoContext, QueueOptions, ReasoningOutcome, ReasoningQueue,
    ReasoningService, ServiceError,
};

/// Answers from the context the way a careful reviewer would.
struct RuleBased;

impl ReasoningService for RuleBased {
    fn check_health(&self) -> bool {
        true
    }

    fn reason(&self, context: &NaranjoContext) -> Result<String, ServiceError> {
        let improved = context
            .grade_changes
            .windows(2)
            .any(|pair| pair[1].grade < pair[0].grade);
        let q3 = if improved { "Yes" } else { "Unknown" };
        let q5 = if context.toxic_drugs.is_empty() { "No" } else { "Yes" };
        Ok(format!(
            "```json\n{{\"answers\":[\
             {{\"question\":\"3\",\"answer\":\"{q3}\",\"reasoning\":\"grades\",\"confidence\":\"Medium\"}},\
             {{\"question\":\"5\",\"answer\":\"{q5}\",\"reasoning\":\"toxic list\",\"confidence\":\"High\"}}],\
             \"overallAssessment\":\"rule based\"}}\n```"
        ))
    }
}

fn patient() -> PatientDrugData {
    PatientDrugData::from_rows([
        (Some(ConceptId::from(42920398)), "atezolizumab", 1),
        (Some(ConceptId::from(19019073)), "pantoprazole", 1),
        (Some(ConceptId::from(42920398)), "atezolizumab", 22),
    ])
}

#[test]
fn queue_scores_patient_without_alternative_causes() {
    let data = patient();
    let reference =
        ToxicityReference::from_pairs([(ConceptId::from(1545998), Some("atorvastatin"))]);
    let classification = classify_patient(&data, &reference, &ClassifierOptions::default());
    let grades = [
        GradePoint::new(1, 0),
        GradePoint::new(15, 3),
        GradePoint::new(30, 1),
    ];
    let context = NaranjoContext::build(&data, &classification, &IciAllowList::default(), &grades);

    let queue = ReasoningQueue::spawn(
        RuleBased,
        QueueOptions::default().with_request_delay(Duration::ZERO),
    );
    assert!(queue.check_health());
    let ReasoningOutcome::Completed { assessment, raw } = queue.submit(context).wait() else {
        panic!("expected completion");
    };

    assert!(raw.starts_with("```json"));
    // fixed 4, Q3 yes +1, Q4 missing 0, Q5 no +2
    assert_eq!(assessment.score, 7);
    assert_eq!(assessment.category, NaranjoCategory::Probable);
    assert_eq!(assessment.overall_assessment, "rule based");
    assert!(!assessment.is_complete());

    insta::assert_json_snapshot!(assessment.answer(4).unwrap(), @r#"
    {
      "question": 4,
      "answer": "Unknown",
      "reasoning": "No AI response available",
      "confidence": "Low"
    }
    "#);
}
