use std::sync::Arc;

use proptest::prelude::*;

use liveplot_cursor_sync::{
    ChartGeometry, CursorId, CursorRecord, GroupId, GroupSnapshot, OverlayEntry, OverlaySynthesizer,
    SyncRequest, TimeViewport, mirrors_snapshot, overlay_ids, reconcile,
};

struct UnitSynthesizer;

impl OverlaySynthesizer for UnitSynthesizer {
    type Children = ();

    fn synthesize_children(&self, _: &CursorId, _: &CursorRecord, _: &ChartGeometry) {}
}

fn cursor_id() -> impl Strategy<Value = String> {
    (0_u8..8).prop_map(|n| format!("tc-{n}"))
}

fn timestamp() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => (0_i64..100_000).prop_map(|ms| ms as f64),
        1 => Just(f64::NAN),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn group_state() -> impl Strategy<Value = GroupSnapshot> {
    prop::collection::vec((cursor_id(), timestamp(), 0_usize..5), 0..8).prop_map(|records| {
        GroupSnapshot::from_records(
            records
                .into_iter()
                .map(|(id, ts, color)| (CursorId::new(id), CursorRecord::new(ts, color))),
        )
    })
}

fn local_overlays() -> impl Strategy<Value = Vec<Arc<OverlayEntry<()>>>> {
    prop::collection::vec((cursor_id(), 0_i64..100_000, any::<bool>()), 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, ts, built)| {
                let id = CursorId::new(id);
                let entry = if built {
                    OverlayEntry::new(id, ts as f64, ())
                } else {
                    OverlayEntry::without_children(id, ts as f64)
                };
                Arc::new(entry)
            })
            .collect()
    })
}

fn run(
    overlays: &[Arc<OverlayEntry<()>>],
    snapshot: &GroupSnapshot,
    sync_enabled: bool,
) -> Option<Vec<Arc<OverlayEntry<()>>>> {
    let group = GroupId::new("group1");
    let geometry = ChartGeometry::new(400.0, 200.0);
    let request = SyncRequest {
        overlays,
        group: &group,
        snapshot,
        viewport: TimeViewport::new(0.0, 50_000.0),
        geometry: &geometry,
        sync_enabled,
    };
    reconcile(&request, &UnitSynthesizer).map(|result| result.overlays)
}

proptest! {
    #[test]
    fn result_mirrors_group(overlays in local_overlays(), snapshot in group_state()) {
        let next = run(&overlays, &snapshot, true).unwrap_or(overlays);
        prop_assert!(mirrors_snapshot(&next, &snapshot));

        let expected: Vec<_> = snapshot
            .cursors()
            .iter()
            .filter(|(_, record)| record.is_well_formed())
            .map(|(id, _)| id.clone())
            .collect();
        prop_assert_eq!(overlay_ids(&next).into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn second_pass_reports_no_change(overlays in local_overlays(), snapshot in group_state()) {
        let next = run(&overlays, &snapshot, true).unwrap_or(overlays);
        prop_assert!(run(&next, &snapshot, true).is_none());
    }

    #[test]
    fn disabled_sync_is_always_a_noop(overlays in local_overlays(), snapshot in group_state()) {
        prop_assert!(run(&overlays, &snapshot, false).is_none());
    }

    #[test]
    fn every_emitted_entry_has_children(overlays in local_overlays(), snapshot in group_state()) {
        if let Some(next) = run(&overlays, &snapshot, true) {
            prop_assert!(next.iter().all(|entry| entry.children.is_some()));
        }
    }
}
