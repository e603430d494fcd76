//! Grouping tests: boundary detection, merge/split behaviour, leaf accounting.

use capsgen::{group_rows, Group, GroupError, Hierarchy, Mode, Row};

fn decode_row(line: usize, codec: &str, profile: &str, mem: &str, fmt: &str) -> Row {
    let fields = [
        codec, "LVL", profile, mem, "64", "4096", "8", "64", "4096", "8", fmt,
    ];
    Row::new(line, fields.iter().map(|s| s.to_string()).collect())
}

/// (key, member count, leaves) for every group, depth first.
fn shape(groups: &[Group<'_>]) -> Vec<(String, usize, Vec<String>)> {
    let mut out = Vec::new();
    for g in groups {
        let mut leaves: Vec<String> = g.leaves().iter().map(|s| s.to_string()).collect();
        leaves.sort();
        out.push((g.key.to_string(), g.len(), leaves));
        out.extend(shape(g.children()));
    }
    out
}

/// Two codecs; H264 has one profile with two memory groups ([X, Y], [Z]); HEVC has 1/1/1.
#[test]
fn grouping_boundary_example() {
    let rows = vec![
        decode_row(2, "H264", "P_HIGH", "MEM_A", "fmtX"),
        decode_row(3, "H264", "P_HIGH", "MEM_A", "fmtY"),
        decode_row(4, "H264", "P_HIGH", "MEM_B", "fmtZ"),
        decode_row(5, "HEVC", "P_MAIN", "MEM_A", "fmtX"),
    ];
    let groups = group_rows(&rows, &Mode::Decode.layout().hierarchy()).unwrap();

    assert_eq!(groups.len(), 2);

    let h264 = &groups[0];
    assert_eq!(h264.key, "H264");
    assert_eq!(h264.len(), 1);
    let profile = &h264.children()[0];
    assert_eq!(profile.key, "P_HIGH");
    assert_eq!(profile.len(), 2);
    assert_eq!(profile.children()[0].key, "MEM_A");
    assert_eq!(profile.children()[0].leaves(), &["fmtX", "fmtY"]);
    assert_eq!(profile.children()[1].key, "MEM_B");
    assert_eq!(profile.children()[1].leaves(), &["fmtZ"]);

    let hevc = &groups[1];
    assert_eq!(hevc.key, "HEVC");
    assert_eq!(hevc.len(), 1);
    assert_eq!(hevc.children()[0].len(), 1);
    assert_eq!(hevc.children()[0].children()[0].leaves(), &["fmtX"]);
    assert_eq!(hevc.leaf_count(), 1);
}

/// Interleaved rows with the same key tuple end up in one group, never split.
#[test]
fn grouping_merges_interleaved_rows() {
    let rows = vec![
        decode_row(2, "AVC", "HIGH", "SYS", "I420"),
        decode_row(3, "AV1", "MAIN", "SYS", "I420"),
        decode_row(4, "AVC", "HIGH", "SYS", "NV12"),
        decode_row(5, "AV1", "MAIN", "SYS", "I010"),
        decode_row(6, "AVC", "HIGH", "SYS", "YUY2"),
    ];
    let groups = group_rows(&rows, &Mode::Decode.layout().hierarchy()).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, "AV1");
    assert_eq!(groups[1].key, "AVC");
    let avc_mem = &groups[1].children()[0].children()[0];
    // Ties keep file order.
    assert_eq!(avc_mem.leaves(), &["I420", "NV12", "YUY2"]);
    // Group closes on the last row of its run.
    assert_eq!(avc_mem.row.line, 6);
}

/// Input order changes only the order of leaves inside a group, not the grouping.
#[test]
fn grouping_independent_of_row_order() {
    let rows = vec![
        decode_row(2, "HEVC", "MAIN10", "SYS", "P010"),
        decode_row(3, "HEVC", "MAIN", "SYS", "I420"),
        decode_row(4, "AVC", "HIGH", "VA", "NV12"),
        decode_row(5, "HEVC", "MAIN", "SYS", "NV12"),
        decode_row(6, "AVC", "HIGH", "SYS", "I420"),
        decode_row(7, "AVC", "MAIN", "SYS", "I420"),
    ];
    let mut reversed = rows.clone();
    reversed.reverse();
    let hierarchy = Mode::Decode.layout().hierarchy();

    let a = group_rows(&rows, &hierarchy).unwrap();
    let b = group_rows(&reversed, &hierarchy).unwrap();
    assert_eq!(shape(&a), shape(&b));
}

/// Every row contributes exactly one leaf; parent counts match child lists.
#[test]
fn grouping_leaf_and_count_accounting() {
    let codecs = ["A", "B", "C"];
    let profiles = ["P1", "P2"];
    let mems = ["M1", "M2", "M3"];
    let mut rows = Vec::new();
    let mut line = 2;
    for (i, c) in codecs.iter().enumerate() {
        for p in profiles.iter().take(i + 1) {
            for m in mems.iter().take(3 - i) {
                for f in ["F1", "F2"] {
                    rows.push(decode_row(line, c, p, m, f));
                    line += 1;
                }
            }
        }
    }
    let groups = group_rows(&rows, &Mode::Decode.layout().hierarchy()).unwrap();

    let total: usize = groups.iter().map(Group::leaf_count).sum();
    assert_eq!(total, rows.len());

    fn check(g: &Group<'_>) {
        if g.children().is_empty() {
            assert_eq!(g.len(), g.leaves().len());
        } else {
            assert_eq!(g.len(), g.children().len());
            g.children().iter().for_each(check);
        }
    }
    groups.iter().for_each(check);

    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].len(), 1);
    assert_eq!(groups[1].len(), 2);
    assert_eq!(groups[2].len(), 2);
    assert_eq!(groups[0].children()[0].len(), 3);
    assert_eq!(groups[2].children()[0].len(), 1);
}

/// No rows → empty table error.
#[test]
fn grouping_empty_rows() {
    let rows: Vec<Row> = Vec::new();
    assert_eq!(
        group_rows(&rows, &Mode::Vpp.layout().hierarchy()).unwrap_err(),
        GroupError::EmptyTable
    );
}

/// Key column past the row width → missing column error, not a panic.
#[test]
fn grouping_missing_key_column() {
    let rows = vec![Row::new(2, vec!["A".to_string(), "B".to_string()])];
    let hierarchy = Hierarchy::new(vec![0, 3], 1);
    assert_eq!(
        group_rows(&rows, &hierarchy).unwrap_err(),
        GroupError::MissingColumn {
            line: 2,
            column: 3,
            width: 2
        }
    );
}

/// A key value shared by different parents is grouped separately under each parent.
#[test]
fn grouping_same_inner_key_under_different_parents() {
    let rows = vec![
        decode_row(2, "A", "P", "M", "F1"),
        decode_row(3, "B", "P", "M", "F2"),
    ];
    let groups = group_rows(&rows, &Mode::Decode.layout().hierarchy()).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].children()[0].children()[0].leaves(), &["F1"]);
    assert_eq!(groups[1].children()[0].children()[0].leaves(), &["F2"]);
}

/// A hierarchy without key columns cannot form groups and is rejected.
#[test]
fn grouping_rejects_hierarchy_without_keys() {
    let rows = vec![decode_row(2, "A", "P", "M", "F1")];
    let hierarchy = Hierarchy::new(Vec::new(), 10);
    assert_eq!(hierarchy.depth(), 0);
    assert_eq!(group_rows(&rows, &hierarchy).unwrap_err(), GroupError::NoKeys);
}
