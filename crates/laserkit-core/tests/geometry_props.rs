use laserkit_core::{nest, PathGroup, PathPoint, Point, Polygon};
use proptest::prelude::*;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Polygon {
    Polygon::from_xy(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)], 0.0)
}

proptest! {
    #[test]
    fn prop_winding_setters_fix_sign(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        w in 0.1f64..50.0,
        h in 0.1f64..50.0,
        reversed in any::<bool>(),
    ) {
        let mut poly = rect(x, y, w, h);
        if reversed {
            poly.points.reverse();
        }
        poly.set_clockwise();
        prop_assert!(poly.area() < 0.0);
        poly.set_counter_clockwise();
        prop_assert!(poly.area() > 0.0);
        prop_assert!((poly.area() - w * h).abs() < 1e-6 * w * h.max(1.0));
    }

    #[test]
    fn prop_shrunk_rectangle_is_inside(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        w in 1.0f64..50.0,
        h in 1.0f64..50.0,
        inset in 0.01f64..0.49,
    ) {
        let outer = rect(x, y, w, h);
        let inner = rect(x + w * inset, y + h * inset, w * (1.0 - 2.0 * inset), h * (1.0 - 2.0 * inset));
        prop_assert!(inner.is_inside(&outer));
        prop_assert!(!outer.is_inside(&inner));
        prop_assert!(outer.is_inside(&outer));
    }

    #[test]
    fn prop_nested_rings_alternate_outer_and_hole(depth in 1usize..6) {
        // concentric squares, 1 apart
        let rings: Vec<Polygon> = (0..depth)
            .map(|i| {
                let inset = i as f64;
                let size = 2.0 * depth as f64 - 2.0 * inset;
                rect(inset, inset, size, size)
            })
            .collect();
        let tops = nest(rings);

        prop_assert_eq!(tops.len(), (depth + 1) / 2);
        for top in &tops {
            prop_assert!(!top.is_clockwise());
            prop_assert!(top.inner.len() <= 1);
            for hole in &top.inner {
                prop_assert!(hole.is_clockwise());
                prop_assert!(hole.is_inside(top));
            }
        }
    }

    #[test]
    fn prop_normalize_moves_group_to_origin(
        pts in proptest::collection::vec((-500.0f64..500.0, -500.0f64..500.0), 2..30),
    ) {
        let mut group = PathGroup::new(1.0);
        for (i, &(x, y)) in pts.iter().enumerate() {
            let p = Point::new(x, y, 3.0);
            group.push(if i == 0 { PathPoint::travel(p, 1.0) } else { PathPoint::cut(p, 1.0, 1) });
        }
        let before = group.bounds();
        group.normalize();
        let after = group.bounds();

        prop_assert!(after.min_x.abs() < 1e-9);
        prop_assert!(after.min_y.abs() < 1e-9);
        prop_assert!((group.width - before.width()).abs() < 1e-9);
        prop_assert!((group.height - before.height()).abs() < 1e-9);
        prop_assert!(group.points.iter().all(|p| p.point.z == 3.0));
    }
}
