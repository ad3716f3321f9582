use std::sync::Arc;

use liveplot_cursor_sync::{
    ChartCursorSync, ChartGeometry, CursorId, CursorRecord, GroupId, MarkerSynthesizer,
    TimeViewport, TrendCursorStore, mirrors_snapshot,
};

fn chart(store: &TrendCursorStore, group: &str) -> ChartCursorSync<MarkerSynthesizer> {
    let mut chart = ChartCursorSync::new(
        store.clone(),
        GroupId::new(group),
        MarkerSynthesizer::default(),
        TimeViewport::new(0.0, 60_000.0),
        ChartGeometry::new(640.0, 320.0).with_value_range(0.0, 30.0),
    );
    chart.attach();
    chart.refresh();
    chart
}

#[test]
fn cursor_placed_on_one_chart_appears_on_the_other() {
    let store = TrendCursorStore::new();
    let mut top = chart(&store, "group1");
    let mut bottom = chart(&store, "group1");

    let id = top.place_cursor(10_000.0).expect("place");
    assert!(bottom.has_pending_update());
    assert!(bottom.refresh());

    assert_eq!(bottom.overlays().len(), 1);
    assert_eq!(bottom.overlays()[0].id, id);
    assert_eq!(bottom.overlays()[0].timestamp_ms, 10_000.0);
}

#[test]
fn drag_and_delete_propagate_across_group() {
    let store = TrendCursorStore::new();
    let mut top = chart(&store, "group1");
    let mut bottom = chart(&store, "group1");

    let id = top.place_cursor(10_000.0).expect("place");
    bottom.refresh();
    let bottom_children = bottom.overlays()[0].children.clone().expect("children");

    bottom.drag_cursor(&id, 20_000.0).expect("drag");
    assert!(top.refresh());
    assert_eq!(top.overlays()[0].timestamp_ms, 20_000.0);
    assert!(Arc::ptr_eq(
        &bottom_children,
        bottom.overlays()[0].children.as_ref().expect("children"),
    ));

    top.delete_cursor(&id).expect("delete");
    assert!(bottom.refresh());
    assert!(bottom.overlays().is_empty());
    assert!(!bottom.refresh());
}

#[test]
fn groups_are_isolated() {
    let store = TrendCursorStore::new();
    let mut first = chart(&store, "group1");
    let mut second = chart(&store, "group2");

    first.place_cursor(5_000.0).expect("place");
    assert!(!second.has_pending_update());
    assert!(!second.refresh());
    assert!(second.overlays().is_empty());
}

#[test]
fn opted_out_chart_is_never_touched() {
    let store = TrendCursorStore::new();
    let mut linked = chart(&store, "group1");
    let mut solo = chart(&store, "group1");
    solo.set_sync_enabled(false);

    linked.place_cursor(1_000.0).expect("place");
    linked.place_cursor(2_000.0).expect("place");
    assert!(!solo.refresh());
    assert!(solo.overlays().is_empty());
}

#[test]
fn externally_inserted_bad_record_does_not_block_others() {
    let store = TrendCursorStore::new();
    let mut chart = chart(&store, "group1");
    let group = chart.group().clone();

    store.insert_record(&group, CursorId::new("broken"), CursorRecord::new(f64::NAN, 0));
    store.insert_record(&group, CursorId::new("ok"), CursorRecord::new(3_000.0, 1));
    assert!(chart.refresh());

    assert_eq!(chart.overlays().len(), 1);
    assert_eq!(chart.overlays()[0].id.as_str(), "ok");
    assert!(mirrors_snapshot(chart.overlays(), &store.snapshot(&group)));
}

#[test]
fn detached_chart_stops_receiving_notifications() {
    let store = TrendCursorStore::new();
    let mut chart = chart(&store, "group1");
    let group = chart.group().clone();
    assert_eq!(store.subscriber_count(&group), 1);

    chart.detach();
    assert_eq!(store.subscriber_count(&group), 0);
    store.add_cursor(&group, 1.0).expect("add");
    assert!(!chart.has_pending_update());

    // An explicit refresh still reads the latest group state.
    assert!(chart.refresh());
    assert_eq!(chart.applied_revision(), Some(1));
}
