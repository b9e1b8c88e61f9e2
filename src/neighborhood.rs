use itertools::iproduct;

use crate::parameters::LeapRing;

/// The eight immediate neighbours, north-west to south-east.
pub const MOORE: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/**
Relative positions searched for destinations of migrants.

The leap offsets are computed once when the grid is built. For larger leap
distances they are dozens of cells, and they are consulted every time a crowded
cell has no free neighbour.

```
# use model::neighborhood::Neighborhood;
# use model::parameters::LeapRing;
let exact = Neighborhood::new(2, LeapRing::Exact);
assert_eq!(exact.leap().len(), 12);
assert!(exact.leap().contains(&(2, 1)));
assert!(!exact.leap().contains(&(2, 2)));
```
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Neighborhood {
    leap: Vec<(i32, i32)>,
}

impl Neighborhood {
    pub fn new(leap_distance: u32, ring: LeapRing) -> Neighborhood {
        let d = leap_distance as i32;
        let leap = if d == 0 {
            vec![]
        } else {
            iproduct!(-d..=d, -d..=d)
                .map(|(d_row, d_column)| (d_column, d_row))
                .filter(|&(d_column, d_row)| {
                    let distance = f64::from(d_column).hypot(f64::from(d_row)).round() as i32;
                    match ring {
                        LeapRing::Exact => distance == d,
                        LeapRing::Within => 1 < distance && distance <= d,
                    }
                })
                .collect()
        };
        Neighborhood { leap }
    }

    pub fn moore(&self) -> &[(i32, i32)] {
        &MOORE
    }

    pub fn leap(&self) -> &[(i32, i32)] {
        &self.leap
    }
}
