//! Integration tests for pagination, settling and position restore

mod common;

use common::{word_index, ScriptedHost};
use flowpages::{
    Error, Key, LayoutParams, LeafIndex, Pages, PagesConfig, Position, ReaderEvent, RelayoutCause,
    SettleOutcome, SettleStatus, SimulatedHost, Viewport,
};
use std::sync::{Arc, Mutex};

/// 800x600, 50px margins, one column at 20px: 700px columns, 750px pages
fn config() -> PagesConfig {
    PagesConfig {
        viewport: Viewport {
            width: 800,
            height: 600,
        },
        layout: LayoutParams {
            margin: 50,
            columns: 1,
            font_size: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// One 10-character text leaf at the top of each of four pages
fn four_page_host() -> (ScriptedHost, LeafIndex) {
    let mut host = ScriptedHost::with_extent(3000.0);
    for page in 0..4 {
        host.push_text(50.0 + page as f64 * 750.0, 50.0, 10);
    }
    (host, common::text_index(4, 10))
}

fn settled_four_pages() -> Pages<ScriptedHost> {
    let (host, index) = four_page_host();
    let mut pages = Pages::new(host, index, config()).unwrap();
    pages.run_until_settled().unwrap();
    pages
}

fn record_events(pages: &mut Pages<impl flowpages::LayoutHost>) -> Arc<Mutex<Vec<ReaderEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    pages.subscribe(move |ev| sink.lock().unwrap().push(ev.clone()));
    seen
}

#[test]
fn test_construct_settles_on_first_page() {
    let (host, index) = four_page_host();
    let mut pages = Pages::new(host, index, config()).unwrap();
    assert!(pages.is_settling());

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.cause, RelayoutCause::Construct);
    assert_eq!(report.outcome, SettleOutcome::Settled);
    assert_eq!(report.polls, 2);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.restored_page, 0);
    assert_eq!(report.position, None);
    assert_eq!(pages.page_count(), 4);
    assert!(!pages.is_settling());
    assert_eq!(pages.poll_settle(), SettleStatus::Idle);
}

#[test]
fn test_current_page_counts_from_one() {
    let mut pages = settled_four_pages();
    assert_eq!(pages.current_page(), 1);
    assert_eq!(pages.page_index(), 0);
    assert_eq!(pages.page_count(), 4);

    pages.go_to_next_page();
    assert_eq!(pages.current_page(), 2);
    pages.go_to_page(9);
    assert_eq!(pages.current_page(), pages.page_count());
}

#[test]
fn test_next_then_prev_returns_to_start() {
    let mut pages = settled_four_pages();
    pages.go_to_next_page();
    assert_eq!(pages.page_index(), 1);
    assert_eq!(pages.host().offset, -750.0);
    assert_eq!(pages.host().shifts.last(), Some(&(-750.0, true)));

    pages.go_to_prev_page();
    assert_eq!(pages.page_index(), 0);
    assert_eq!(pages.host().offset, 0.0);
}

#[test]
fn test_prev_on_first_page_never_goes_negative() {
    let mut pages = settled_four_pages();
    let seen = record_events(&mut pages);

    pages.go_to_prev_page();
    pages.go_to_prev_page();
    assert_eq!(pages.page_index(), 0);
    assert_eq!(pages.host().offset, 0.0);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ReaderEvent::PageChanged { page: 0 },
            ReaderEvent::PageChanged { page: 0 }
        ]
    );
}

#[test]
fn test_next_on_last_page_stays_put() {
    let mut pages = settled_four_pages();
    for _ in 0..6 {
        pages.go_to_next_page();
    }
    assert_eq!(pages.page_index(), 3);
    assert_eq!(pages.host().offset, -2250.0);
}

#[test]
fn test_two_columns_turn_a_whole_spread() {
    let (host, index) = four_page_host();
    let mut cfg = config();
    cfg.layout.columns = 2;
    let mut pages = Pages::new(host, index, cfg).unwrap();
    pages.run_until_settled().unwrap();
    assert_eq!(pages.geometry().column_width, 325);
    assert_eq!(pages.geometry().page_width, 750);

    pages.go_to_next_page();
    assert_eq!(pages.page_index(), 2);
    pages.go_to_next_page();
    assert_eq!(pages.page_index(), 3);
    pages.go_to_prev_page();
    assert_eq!(pages.page_index(), 1);
}

#[test]
fn test_page_turns_emit_page_changed() {
    let mut pages = settled_four_pages();
    let seen = record_events(&mut pages);
    pages.go_to_next_page();
    pages.go_to_next_page();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ReaderEvent::PageChanged { page: 1 },
            ReaderEvent::PageChanged { page: 2 }
        ]
    );
}

#[test]
fn test_arrow_keys_turn_pages() {
    let mut pages = settled_four_pages();
    assert!(pages.handle_key(Key::from_name("ArrowRight")));
    assert_eq!(pages.page_index(), 1);
    assert!(pages.handle_key(Key::ArrowLeft));
    assert_eq!(pages.page_index(), 0);
    assert!(!pages.handle_key(Key::from_name("Enter")));
}

#[test]
fn test_settle_waits_for_the_extent_to_stop_changing() {
    // four columns of text that appear one poll at a time
    let index = word_index(40);
    let host = SimulatedHost::new(&index).with_reflow_polls(3);
    let mut pages = Pages::new(host, index, config()).unwrap();

    let mut samples = Vec::new();
    let report = loop {
        match pages.poll_settle() {
            SettleStatus::Polling { last_page, .. } => samples.push(last_page),
            SettleStatus::Done(report) => break report,
            SettleStatus::Idle => panic!("settle ended without a report"),
        }
    };

    assert_eq!(samples, vec![0, 1, 2, 3]);
    assert_eq!(report.polls, 5);
    assert_eq!(report.last_page, 3);
    assert_eq!(report.outcome, SettleOutcome::Settled);
    assert_eq!(pages.host().extent_polls(), 5);
    assert!(report.warning().is_none());
}

#[test]
fn test_unsettled_layout_gives_up_at_the_cap() {
    let (host, index) = four_page_host();
    let mut cfg = config();
    cfg.max_settle_polls = 4;
    let mut pages = Pages::new(host, index, cfg).unwrap();
    pages.host().script_extents(&[750.0, 1500.0, 2250.0, 3000.0, 3750.0]);

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.outcome, SettleOutcome::Unsettled);
    assert_eq!(report.polls, 4);
    assert_eq!(report.last_page, 3);
    assert_eq!(
        report.warning(),
        Some(Error::LayoutUnsettled {
            polls: 4,
            last_page: 3
        })
    );
    assert_eq!(pages.host().extent_polls(), 4);
    assert_eq!(pages.page_count(), 4);
}

#[test]
fn test_shrinking_content_clamps_the_current_page() {
    let mut pages = settled_four_pages();
    pages.go_to_next_page();
    pages.go_to_next_page();
    pages.go_to_next_page();
    assert_eq!(pages.page_index(), 3);

    pages.set_background_color("#000").unwrap();
    pages.host().script_extents(&[1500.0]);
    match pages.poll_settle() {
        SettleStatus::Polling { last_page, .. } => assert_eq!(last_page, 1),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(pages.page_index(), 1);
    assert_eq!(pages.host().offset, -750.0);
}

#[test]
fn test_invalid_layout_change_keeps_previous_geometry() {
    let mut pages = settled_four_pages();
    let geometry = *pages.geometry();
    let generation = pages.generation();
    let layouts = pages.host().layouts.len();

    let err = pages.set_margin(400).unwrap_err();
    assert_eq!(
        err,
        Error::InvalidLayout {
            viewport_width: 800,
            margin: 400,
            columns: 1
        }
    );
    assert!(matches!(pages.set_columns(0), Err(Error::InvalidLayout { .. })));
    assert!(matches!(
        pages.resize(Viewport {
            width: 90,
            height: 600
        }),
        Err(Error::InvalidLayout { .. })
    ));

    assert_eq!(*pages.geometry(), geometry);
    assert_eq!(pages.params().margin, 50);
    assert_eq!(pages.params().columns, 1);
    assert_eq!(pages.generation(), generation);
    assert_eq!(pages.host().layouts.len(), layouts);
    assert!(!pages.is_settling());
}

#[test]
fn test_invalid_initial_layout_is_rejected() {
    let (host, index) = four_page_host();
    let mut cfg = config();
    cfg.layout.margin = 400;
    assert!(matches!(
        Pages::new(host, index, cfg),
        Err(Error::InvalidLayout { .. })
    ));
}

#[test]
fn test_bad_base_url_is_a_config_error() {
    let (host, index) = four_page_host();
    let mut cfg = config();
    cfg.base_url = Some("not a url".into());
    assert!(matches!(
        Pages::new(host, index, cfg),
        Err(Error::ConfigError(_))
    ));
}

#[test]
fn test_resize_recomputes_geometry() {
    let mut pages = settled_four_pages();
    pages
        .resize(Viewport {
            width: 1600,
            height: 900,
        })
        .unwrap();
    assert_eq!(pages.geometry().column_width, 1500);
    assert_eq!(pages.geometry().page_width, 1550);
    assert_eq!(pages.geometry().content_height, 800);
    let applied = pages.host().layouts.last().unwrap();
    assert_eq!(applied.geometry, *pages.geometry());

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.cause, RelayoutCause::Resize);
    assert_eq!(report.position, Some(Position::Text { text_leaf_index: 0, char_offset: 0 }));
}

#[test]
fn test_background_color_goes_through_relayout() {
    let mut pages = settled_four_pages();
    let generation = pages.generation();
    pages.set_background_color("#000").unwrap();
    assert_eq!(pages.generation(), generation + 1);
    assert!(pages.is_settling());
    let css = pages.host().layouts.last().unwrap().to_css();
    assert!(css.contains("background-color: #000 !important;"));

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.cause, RelayoutCause::BackgroundColor);
}

#[test]
fn test_new_relayout_cancels_the_one_in_flight() {
    let mut pages = settled_four_pages();
    pages.go_to_next_page();
    pages.go_to_next_page();

    pages.set_font_size(40).unwrap();
    let first = pages.generation();
    assert!(matches!(pages.poll_settle(), SettleStatus::Polling { .. }));

    // reader keeps going while the first re-layout is still settling
    pages.go_to_next_page();
    assert_eq!(pages.page_index(), 3);
    pages.set_columns(2).unwrap();
    assert_eq!(pages.generation(), first + 1);

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.generation, first + 1);
    assert_eq!(report.cause, RelayoutCause::Columns);
    assert_eq!(
        report.position,
        Some(Position::Text {
            text_leaf_index: 3,
            char_offset: 0
        })
    );
    assert_eq!(report.restored_page, 3);
    assert_eq!(pages.page_index(), 3);
    assert_eq!(pages.poll_settle(), SettleStatus::Idle);
}

#[test]
fn test_cancel_settle_skips_the_restore() {
    let mut pages = settled_four_pages();
    pages.go_to_next_page();
    pages.set_font_size(24).unwrap();
    assert!(pages.cancel_settle());
    assert!(!pages.cancel_settle());
    assert_eq!(pages.poll_settle(), SettleStatus::Idle);
    assert_eq!(pages.run_until_settled(), None);
    assert_eq!(pages.page_index(), 1);
}

#[test]
fn test_go_to_position_while_settling_replaces_the_restore_target() {
    let mut pages = settled_four_pages();
    pages.set_font_size(40).unwrap();

    let target = Position::Text {
        text_leaf_index: 2,
        char_offset: 5,
    };
    pages.go_to_position(target).unwrap();
    assert_eq!(pages.page_index(), 2);

    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.position, Some(target));
    assert_eq!(report.restored_page, 2);
    assert_eq!(pages.page_index(), 2);
}

#[test]
fn test_go_to_position_rejects_unknown_leaves() {
    let mut pages = settled_four_pages();
    let err = pages
        .go_to_position(Position::Text {
            text_leaf_index: 9,
            char_offset: 0,
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPosition(_)));
    assert_eq!(pages.page_index(), 0);
}

#[test]
fn test_position_survives_a_font_size_change() {
    // 40 leaves of two lines each: four pages at 20px
    let index = word_index(40);
    let host = SimulatedHost::new(&index);
    let mut pages = Pages::new(host, index, config()).unwrap();
    pages.run_until_settled().unwrap();
    assert_eq!(pages.page_count(), 4);

    pages.go_to_next_page();
    pages.go_to_next_page();
    let position = pages.position().unwrap();
    assert_eq!(
        position,
        Position::Text {
            text_leaf_index: 20,
            char_offset: 0
        }
    );

    // four lines a leaf at 40px, ten lines a page
    pages.set_font_size(40).unwrap();
    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.cause, RelayoutCause::FontSize);
    assert_eq!(report.position, Some(position));
    assert_eq!(pages.page_count(), 16);
    assert_eq!(report.restored_page, 8);
    assert_eq!(pages.position().unwrap(), position);

    pages.set_font_size(20).unwrap();
    let report = pages.run_until_settled().unwrap();
    assert_eq!(report.restored_page, 2);
    assert_eq!(pages.position().unwrap(), position);
}

#[test]
fn test_position_on_empty_document_is_an_error() {
    let index = LeafIndex::default();
    let host = SimulatedHost::new(&index);
    let mut pages = Pages::new(host, index, config()).unwrap();
    pages.run_until_settled().unwrap();
    assert_eq!(pages.page_count(), 1);
    assert_eq!(pages.position(), Err(Error::NoContentOnPage { page: 0 }));
}
