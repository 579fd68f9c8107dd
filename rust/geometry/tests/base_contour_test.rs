// Base footprint extraction followed by nested contour filtering
use antiwarp_geometry::{BaseContourExtractor, ContourFilter, Mesh, Polygon2D};
use approx::assert_abs_diff_eq;

/// Closed axis-aligned box from unindexed triangle runs
fn box_mesh(min: [f64; 3], max: [f64; 3]) -> Mesh {
    let corner = |x: usize, y: usize, z: usize| {
        [
            if x == 0 { min[0] } else { max[0] },
            if y == 0 { min[1] } else { max[1] },
            if z == 0 { min[2] } else { max[2] },
        ]
    };
    let quads = [
        [corner(0, 0, 0), corner(1, 0, 0), corner(1, 0, 1), corner(0, 0, 1)],
        [corner(0, 1, 0), corner(0, 1, 1), corner(1, 1, 1), corner(1, 1, 0)],
        [corner(0, 0, 0), corner(0, 1, 0), corner(1, 1, 0), corner(1, 0, 0)],
        [corner(0, 0, 1), corner(1, 0, 1), corner(1, 1, 1), corner(0, 1, 1)],
        [corner(0, 0, 0), corner(0, 0, 1), corner(0, 1, 1), corner(0, 1, 0)],
        [corner(1, 0, 0), corner(1, 1, 0), corner(1, 1, 1), corner(1, 0, 1)],
    ];

    let mut positions = Vec::new();
    for q in quads {
        for v in [q[0], q[1], q[2], q[0], q[2], q[3]] {
            positions.extend(v.iter().map(|&c| c as f32));
        }
    }
    Mesh::from_buffers(positions, None).unwrap()
}

#[test]
fn test_box_footprint_matches_box() {
    let mesh = box_mesh([5.0, 1.0, -3.0], [25.0, 11.0, 7.0]);
    let contours = BaseContourExtractor::default().extract(&mesh);

    assert_eq!(contours.len(), 1);
    assert_eq!(contours[0].len(), 4);
    let expected = Polygon2D::from_xz(&[[5.0, -3.0], [25.0, -3.0], [25.0, 7.0], [5.0, 7.0]]);
    assert!(contours[0].approx_eq(&expected, 1e-5));
    assert_abs_diff_eq!(contours[0].signed_area(), 200.0, epsilon = 1e-3);
}

#[test]
fn test_box_with_indexed_buffers() {
    let positions = vec![
        0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 4.0, 0.0, 4.0, 0.0, 0.0, 4.0, // bottom
        0.0, 2.0, 0.0, 4.0, 2.0, 0.0, 4.0, 2.0, 4.0, 0.0, 2.0, 4.0, // top
    ];
    let indices = vec![
        0, 1, 2, 0, 2, 3, // bottom
        4, 7, 6, 4, 6, 5, // top
        0, 4, 5, 0, 5, 1, // z = 0
        3, 2, 6, 3, 6, 7, // z = 4
        0, 3, 7, 0, 7, 4, // x = 0
        1, 5, 6, 1, 6, 2, // x = 4
    ];
    let mesh = Mesh::from_buffers(positions, Some(indices)).unwrap();

    let contours = BaseContourExtractor::default().extract(&mesh);
    assert_eq!(contours.len(), 1);
    assert_abs_diff_eq!(contours[0].signed_area(), 16.0, epsilon = 1e-4);
}

#[test]
fn test_inner_shell_is_filtered_out() {
    let mut mesh = box_mesh([-20.0, 0.0, -20.0], [20.0, 5.0, 20.0]);
    mesh.merge(&box_mesh([-5.0, 0.0, -5.0], [5.0, 3.0, 5.0]));

    let contours = BaseContourExtractor::default().extract(&mesh);
    assert_eq!(contours.len(), 2);

    let kept = ContourFilter::default().filter(contours);
    assert_eq!(kept.len(), 1);
    assert_abs_diff_eq!(kept[0].signed_area(), 1600.0, epsilon = 1e-2);
}

#[test]
fn test_body_raised_off_the_bed_is_not_sliced() {
    // Second body starts 1 unit above the lowest point, well above the slice
    let mut mesh = box_mesh([0.0, 0.0, 0.0], [10.0, 5.0, 10.0]);
    mesh.merge(&box_mesh([30.0, 1.0, 0.0], [40.0, 5.0, 10.0]));

    let contours = BaseContourExtractor::default().extract(&mesh);
    assert_eq!(contours.len(), 1);

    let (min, max) = contours[0].bounds().unwrap();
    assert_abs_diff_eq!(min.x, 0.0, epsilon = 1e-5);
    assert_abs_diff_eq!(max.x, 10.0, epsilon = 1e-5);
}
