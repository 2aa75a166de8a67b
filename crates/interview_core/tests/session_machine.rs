mod common;

use assert_matches::assert_matches;
use common::{Harness, ScorerReply, START_MILLIS};
use interview_core::llm::{FALLBACK_FEEDBACK, FALLBACK_SCORE};
use interview_core::{
    AdvanceOutcome, Clock, ClockEvent, Difficulty, Evaluation, MemorySessionStore, SessionError,
    SessionStore, Stage, Submission, Tick, TIME_UP_FEEDBACK, TOTAL_QUESTIONS,
};

//=========================================================================================
// Initialization
//=========================================================================================

#[tokio::test]
async fn initialize_without_candidate_is_not_onboarded() {
    let harness = Harness::with_store(MemorySessionStore::new());
    let mut session = harness.session(TOTAL_QUESTIONS);

    assert_matches!(session.initialize().await, Err(SessionError::NotOnboarded));
    assert_eq!(session.stage(), Stage::Loading);
    assert_eq!(harness.generator.calls(), 0);
}

#[tokio::test]
async fn fresh_interview_gets_placeholders_and_first_question() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);

    assert_eq!(session.initialize().await.unwrap(), Stage::AwaitingAnswer);

    let state = session.state().unwrap();
    assert_eq!(state.questions.len(), 6);
    assert_eq!(state.current_index, 0);
    assert!(!state.questions[0].is_placeholder());
    assert!(state.questions[0].id.starts_with("q-"));
    assert_eq!(state.questions[0].reference_solution.as_deref(), Some("Solution 1"));
    assert!(state.questions[1..].iter().all(|q| q.is_placeholder()));
    assert_eq!(state.questions[5].difficulty, Difficulty::Hard);
    assert_eq!(state.timer_ends_at, START_MILLIS + 20_000);
    assert!(!state.is_paused);
    assert_eq!(session.remaining_secs(), 20);
    assert_eq!(harness.generator.calls(), 1);

    let stored = harness.store.get_interview_state().await.unwrap().unwrap();
    assert_eq!(&stored, session.state().unwrap());
    assert_eq!(harness.store.list_questions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn short_stored_interview_is_padded() {
    let harness = Harness::onboarded();
    let mut first = harness.session(2);
    first.initialize().await.unwrap();

    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    reloaded.initialize().await.unwrap();
    let state = reloaded.state().unwrap();
    assert_eq!(state.questions.len(), 6);
    assert_eq!(state.questions[5].id, "placeholder-5");
}

#[tokio::test]
async fn deadline_in_the_past_auto_fails_on_initialize() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    // The tab was closed for longer than the 20s budget.
    harness.clock.advance_secs(25);
    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    assert_eq!(reloaded.initialize().await.unwrap(), Stage::Reviewing);

    let question = reloaded.current_question().unwrap();
    assert_eq!(question.answer.as_deref(), Some(""));
    assert_eq!(question.score, Some(0));
    assert_eq!(question.feedback.as_deref(), Some(TIME_UP_FEEDBACK));
    assert_eq!(question.time_spent_secs, 20);
    assert!(question.is_resolved());
    assert!(reloaded.is_paused());
    assert_eq!(reloaded.remaining_secs(), 0);
    assert_eq!(harness.scorer.calls(), 0);
    assert_eq!(harness.generator.calls(), 1);
}

#[tokio::test]
async fn generation_failure_leaves_session_loading_until_retry() {
    let harness = Harness::onboarded();
    harness.generator.set_fail(true);
    let mut session = harness.session(TOTAL_QUESTIONS);

    assert_matches!(
        session.initialize().await,
        Err(SessionError::GenerationFailed(_))
    );
    assert_eq!(session.stage(), Stage::Loading);
    assert!(session.last_error().is_some());
    assert!(session.current_question().unwrap().is_placeholder());

    harness.generator.set_fail(false);
    assert_eq!(session.initialize().await.unwrap(), Stage::AwaitingAnswer);
    assert!(session.last_error().is_none());
}

//=========================================================================================
// Submission
//=========================================================================================

#[tokio::test]
async fn submission_records_time_spent_from_remaining() {
    let harness = Harness::onboarded();
    harness.generator.set_difficulty(Difficulty::Medium);
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    assert_eq!(session.remaining_secs(), 60);

    harness.clock.advance_secs(15);
    let submission = session.submit_answer("My answer").await.unwrap();
    assert_matches!(submission, Submission::Pending(ref request) if request.time_spent_secs == 15);

    assert_eq!(session.stage(), Stage::Reviewing);
    let question = session.current_question().unwrap();
    assert_eq!(question.answer.as_deref(), Some("My answer"));
    assert_eq!(question.score, Some(85));
    assert_eq!(question.feedback.as_deref(), Some("Good answer."));
    assert_eq!(question.time_spent_secs, 15);
    assert!(session.is_paused());
    assert_eq!(session.remaining_secs(), 45);
    assert_eq!(session.state().unwrap().timer_ends_at, 0);
}

#[tokio::test]
async fn unparsable_scoring_reply_uses_fallback_and_still_advances() {
    let harness = Harness::onboarded();
    harness
        .scorer
        .set_reply(ScorerReply::Raw("Nice effort! I'd give this a solid B."));
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    session.submit_answer("Closures capture variables").await.unwrap();

    assert_eq!(session.stage(), Stage::Reviewing);
    let question = session.current_question().unwrap();
    assert_eq!(question.score, Some(FALLBACK_SCORE));
    assert_eq!(question.feedback.as_deref(), Some(FALLBACK_FEEDBACK));
}

#[tokio::test]
async fn empty_answer_is_rejected_while_time_remains() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    let before = session.state().unwrap().clone();

    assert_eq!(session.submit_answer("   ").await.unwrap(), Submission::Rejected);
    assert_eq!(session.stage(), Stage::AwaitingAnswer);
    assert_eq!(session.state().unwrap(), &before);
    assert_eq!(harness.scorer.calls(), 0);
}

#[tokio::test]
async fn empty_answer_at_zero_takes_the_auto_fail_path() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    harness.clock.advance_secs(20);
    assert_eq!(session.submit_answer("").await.unwrap(), Submission::TimedOut);
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(session.current_question().unwrap().score, Some(0));
    assert_eq!(harness.scorer.calls(), 0);
}

#[tokio::test]
async fn second_submission_is_rejected_while_scoring() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    let request = match session.begin_submission("first").await.unwrap() {
        Submission::Pending(request) => request,
        other => panic!("expected a pending submission, got {:?}", other),
    };
    assert_eq!(session.stage(), Stage::Submitting);

    assert_eq!(session.begin_submission("second").await.unwrap(), Submission::Rejected);
    assert_eq!(session.submit_answer("third").await.unwrap(), Submission::Rejected);
    harness.clock.advance_secs(60);
    assert_eq!(session.tick(), Tick::Idle);
    assert_eq!(harness.scorer.calls(), 0);

    session
        .complete_submission(
            request,
            Ok(Evaluation {
                score: 90,
                feedback: "Great".to_string(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(session.current_question().unwrap().answer.as_deref(), Some("first"));
}

#[tokio::test]
async fn scoring_failure_allows_resubmission() {
    let harness = Harness::onboarded();
    harness.scorer.set_reply(ScorerReply::Fail);
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    assert_matches!(
        session.submit_answer("useEffect runs after paint").await,
        Err(SessionError::ScoringFailed(_))
    );
    assert_eq!(session.stage(), Stage::AwaitingAnswer);
    assert!(!session.current_question().unwrap().is_resolved());

    harness.scorer.set_reply(ScorerReply::Fixed(60, "Partially right."));
    session.submit_answer("useEffect runs after paint").await.unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(harness.scorer.calls(), 2);
}

//=========================================================================================
// Timer
//=========================================================================================

#[tokio::test]
async fn expiry_submits_the_draft() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    session.update_draft("partial answer");

    harness.clock.advance_secs(1);
    assert_eq!(session.handle_tick().await.unwrap(), Tick::Running { remaining: 19 });

    harness.clock.advance_secs(19);
    assert_eq!(session.handle_tick().await.unwrap(), Tick::Expired);
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(harness.scorer.last_answer().as_deref(), Some("partial answer"));
    assert_eq!(session.current_question().unwrap().time_spent_secs, 20);

    harness.clock.advance_secs(1);
    assert_eq!(session.handle_tick().await.unwrap(), Tick::Idle);
    assert_eq!(harness.scorer.calls(), 1);
}

#[tokio::test]
async fn expiry_with_empty_draft_auto_fails_once() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    harness.clock.advance_secs(30);
    assert_eq!(session.handle_tick().await.unwrap(), Tick::Expired);
    assert_eq!(
        session.current_question().unwrap().feedback.as_deref(),
        Some(TIME_UP_FEEDBACK)
    );
    assert_eq!(session.handle_tick().await.unwrap(), Tick::Idle);
    assert_eq!(harness.scorer.calls(), 0);
}

#[tokio::test]
async fn expired_draft_is_handed_back_for_scoring() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    session.update_draft("half done");

    harness.clock.advance_secs(20);
    let request = match session.run_clock().await.unwrap() {
        ClockEvent::Expired(Submission::Pending(request)) => request,
        other => panic!("expected a pending expiry, got {:?}", other),
    };
    assert_eq!(request.answer, "half done");
    assert_eq!(request.time_spent_secs, 20);
    assert_eq!(session.stage(), Stage::Submitting);
    assert_eq!(harness.scorer.calls(), 0);
    assert_eq!(session.run_clock().await.unwrap(), ClockEvent::Idle);

    session
        .complete_submission(
            request,
            Ok(Evaluation {
                score: 40,
                feedback: "Thin".to_string(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(session.current_question().unwrap().score, Some(40));
}

#[tokio::test]
async fn expired_empty_draft_times_out_without_scoring() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    harness.clock.advance_secs(25);
    assert_eq!(
        session.run_clock().await.unwrap(),
        ClockEvent::Expired(Submission::TimedOut)
    );
    assert_eq!(session.stage(), Stage::Reviewing);
    assert_eq!(harness.scorer.calls(), 0);
}

#[tokio::test]
async fn clock_stepping_back_never_adds_time() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    harness.clock.advance_secs(5);
    assert_eq!(session.tick(), Tick::Running { remaining: 15 });
    harness.clock.set_millis(START_MILLIS - 60_000);
    assert_eq!(session.tick(), Tick::Running { remaining: 15 });
    assert_eq!(session.remaining_secs(), 15);
}

#[tokio::test]
async fn pause_toggle_round_trip_preserves_remaining() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    harness.clock.advance_secs(4);
    assert_eq!(session.tick(), Tick::Running { remaining: 16 });

    assert!(session.pause_toggle().await.unwrap());
    assert!(session.is_paused());
    assert_eq!(session.state().unwrap().timer_ends_at, 0);
    assert_eq!(session.tick(), Tick::Idle);

    assert!(!session.pause_toggle().await.unwrap());
    assert!(!session.is_paused());
    assert_eq!(session.remaining_secs(), 16);
    let now = START_MILLIS + 4_000;
    assert_eq!(session.state().unwrap().timer_ends_at, now + 16_000);
}

#[tokio::test]
async fn repeated_pausing_still_charges_running_time() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    for _ in 0..30 {
        harness.clock.advance_millis(900);
        session.handle_tick().await.unwrap();
        if session.stage() != Stage::AwaitingAnswer {
            break;
        }
        assert!(session.pause_toggle().await.unwrap());
        assert!(!session.pause_toggle().await.unwrap());
    }

    // 23 x 900ms of running time exhausts the 20s budget.
    assert_eq!(session.stage(), Stage::Reviewing);
    let question = session.current_question().unwrap();
    assert_eq!(question.score, Some(0));
    assert_eq!(question.feedback.as_deref(), Some(TIME_UP_FEEDBACK));
    assert_eq!(harness.clock.now_millis(), START_MILLIS + 23 * 900);
}

#[tokio::test]
async fn pause_keeps_partial_seconds_across_reload() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    harness.clock.advance_millis(1_500);
    session.pause_toggle().await.unwrap();
    assert_eq!(session.state().unwrap().paused_remaining_ms, Some(18_500));

    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    reloaded.initialize().await.unwrap();
    assert_eq!(reloaded.remaining_secs(), 19);
    assert!(!reloaded.pause_toggle().await.unwrap());
    assert_eq!(
        reloaded.state().unwrap().timer_ends_at,
        START_MILLIS + 1_500 + 18_500
    );
}

#[tokio::test]
async fn pause_survives_reload_without_losing_time() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    harness.clock.advance_secs(5);
    session.pause_toggle().await.unwrap();

    harness.clock.advance_secs(600);
    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    assert_eq!(reloaded.initialize().await.unwrap(), Stage::AwaitingAnswer);
    assert!(reloaded.is_paused());
    assert_eq!(reloaded.remaining_secs(), 15);

    assert!(!reloaded.pause_toggle().await.unwrap());
    harness.clock.advance_secs(1);
    assert_eq!(reloaded.tick(), Tick::Running { remaining: 14 });
}

#[tokio::test]
async fn reload_keeps_questions_and_never_extends_time() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    harness.clock.advance_secs(5);
    session.submit_answer("a").await.unwrap();
    session.advance().await.unwrap();
    harness.clock.advance_secs(3);
    assert_eq!(session.tick(), Tick::Running { remaining: 17 });

    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    assert_eq!(reloaded.initialize().await.unwrap(), Stage::AwaitingAnswer);
    let (before, after) = (session.state().unwrap(), reloaded.state().unwrap());
    assert_eq!(after.questions, before.questions);
    assert_eq!(after.current_index, 1);
    assert!(reloaded.remaining_secs() <= session.remaining_secs());
    assert_eq!(harness.generator.calls(), 2);
}

#[tokio::test]
async fn reload_in_review_restores_review() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    harness.clock.advance_secs(8);
    session.submit_answer("answer").await.unwrap();

    harness.clock.advance_secs(300);
    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    assert_eq!(reloaded.initialize().await.unwrap(), Stage::Reviewing);
    assert_eq!(reloaded.remaining_secs(), 12);
    assert_eq!(reloaded.current_question().unwrap().score, Some(85));
}

//=========================================================================================
// Advancing and completion
//=========================================================================================

#[tokio::test]
async fn advance_before_resolution_is_a_no_op() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    let before = session.state().unwrap().clone();

    assert_eq!(session.advance().await.unwrap(), AdvanceOutcome::NotReady);
    assert_eq!(session.state().unwrap(), &before);
    assert_eq!(session.stage(), Stage::AwaitingAnswer);
    assert_eq!(harness.generator.calls(), 1);
}

#[tokio::test]
async fn advance_provisions_next_slot_and_restarts_clock() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();
    session.submit_answer("answer").await.unwrap();

    harness.clock.advance_secs(7);
    assert_eq!(
        session.advance().await.unwrap(),
        AdvanceOutcome::NextQuestion { index: 1 }
    );
    let state = session.state().unwrap();
    assert_eq!(session.stage(), Stage::AwaitingAnswer);
    assert!(!state.questions[1].is_placeholder());
    assert!(!state.is_paused);
    assert_eq!(state.timer_ends_at, START_MILLIS + 7_000 + 20_000);
    assert_eq!(session.remaining_secs(), 20);
}

#[tokio::test]
async fn last_advance_completes_and_reports_once() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    for i in 0..TOTAL_QUESTIONS {
        session.submit_answer(&format!("answer {}", i)).await.unwrap();
        let outcome = session.advance().await.unwrap();
        if i + 1 < TOTAL_QUESTIONS {
            assert_eq!(outcome, AdvanceOutcome::NextQuestion { index: i + 1 });
        } else {
            assert_eq!(
                outcome,
                AdvanceOutcome::Completed {
                    record_id: harness.records.record_id
                }
            );
        }
    }

    assert_eq!(session.stage(), Stage::Complete);
    assert_eq!(harness.records.attempts(), 1);
    let saved = harness.records.saved();
    assert_eq!(saved[0].len(), TOTAL_QUESTIONS);
    assert!(saved[0].iter().all(|q| q.is_resolved()));

    let stored = harness.store.get_interview_state().await.unwrap().unwrap();
    assert!(stored.is_complete);
    assert_eq!(stored.record_id, Some(harness.records.record_id));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.stage, Stage::Complete);
    let summary = snapshot.summary.unwrap();
    assert_eq!(summary.answered, TOTAL_QUESTIONS);
    assert_eq!(summary.average_score, 85);

    // Neither a stray click nor a reload reports again.
    assert_eq!(session.advance().await.unwrap(), AdvanceOutcome::NotReady);
    let mut reloaded = harness.session(TOTAL_QUESTIONS);
    assert_eq!(reloaded.initialize().await.unwrap(), Stage::Complete);
    assert_eq!(
        reloaded.report_completion().await.unwrap(),
        harness.records.record_id
    );
    assert_eq!(harness.records.attempts(), 1);
}

#[tokio::test]
async fn reporting_an_unfinished_interview_is_refused() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    assert_matches!(
        session.report_completion().await,
        Err(SessionError::NotComplete)
    );
    assert_eq!(harness.records.attempts(), 0);
}

#[tokio::test]
async fn record_failure_keeps_completion_and_can_be_retried() {
    let harness = Harness::onboarded();
    harness.records.set_fail(true);
    let mut session = harness.session(1);
    session.initialize().await.unwrap();
    session.submit_answer("only answer").await.unwrap();

    assert_matches!(session.advance().await, Err(SessionError::RecordFailed(_)));
    assert_eq!(session.stage(), Stage::Complete);
    assert!(session.state().unwrap().record_id.is_none());

    harness.records.set_fail(false);
    assert_eq!(
        session.report_completion().await.unwrap(),
        harness.records.record_id
    );
    assert_eq!(harness.records.attempts(), 2);
    assert_eq!(harness.records.saved().len(), 1);
}

#[tokio::test]
async fn teardown_clears_the_store() {
    let harness = Harness::onboarded();
    let mut session = harness.session(TOTAL_QUESTIONS);
    session.initialize().await.unwrap();

    session.teardown().await.unwrap();
    assert_eq!(session.stage(), Stage::Loading);
    assert!(session.state().is_none());
    assert!(harness.store.get_interview_state().await.unwrap().is_none());
    assert!(harness.store.get_candidate().await.unwrap().is_none());
    assert!(harness.store.list_questions().await.unwrap().is_empty());
}
