//! Parameter space enumeration
//!
//! Exhaustive mode walks the full cross product, row-major with the last
//! axis varying fastest. Pairwise mode builds a covering array with the
//! in-parameter-order (IPOG) strategy: the first two axes are crossed, every
//! further axis is added by horizontal growth (pick the value covering the
//! most new pairs for each existing row) and then vertical growth (new or
//! don't-care rows for the pairs still missing). Both work on value indices
//! only and are fully deterministic.

use crate::axis::{ParameterAxis, ParameterPoint};
use crate::HarnessError;
use tracing::debug;

/// How the axes of a block are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombinationMode {
    #[default]
    Exhaustive,
    Pairwise,
}

/// Full cross product of value indices
pub fn exhaustive(sizes: &[usize]) -> Vec<Vec<usize>> {
    let mut rows: Vec<Vec<usize>> = vec![Vec::new()];
    for &size in sizes {
        rows = rows
            .into_iter()
            .flat_map(|row| {
                (0..size).map(move |v| {
                    let mut next = row.clone();
                    next.push(v);
                    next
                })
            })
            .collect();
    }
    rows
}

/// Covering array of strength two over value indices
pub fn pairwise(sizes: &[usize]) -> Vec<Vec<usize>> {
    if sizes.len() <= 2 || sizes.contains(&0) {
        return exhaustive(sizes);
    }

    let mut rows: Vec<Vec<Option<usize>>> = exhaustive(&sizes[..2])
        .into_iter()
        .map(|row| row.into_iter().map(Some).collect())
        .collect();

    for axis in 2..sizes.len() {
        let size = sizes[axis];
        // covered[j][vj][v] for every earlier axis j
        let mut covered: Vec<Vec<Vec<bool>>> =
            sizes[..axis].iter().map(|&sj| vec![vec![false; size]; sj]).collect();

        // Horizontal growth
        for row in rows.iter_mut() {
            let gain = |v: usize| {
                row.iter()
                    .enumerate()
                    .filter(|(j, vj)| matches!(vj, Some(vj) if !covered[*j][*vj][v]))
                    .count()
            };
            let mut best = 0;
            let mut best_gain = gain(0);
            for v in 1..size {
                let g = gain(v);
                if g > best_gain {
                    best = v;
                    best_gain = g;
                }
            }
            for (j, vj) in row.iter().enumerate() {
                if let Some(vj) = vj {
                    covered[j][*vj][best] = true;
                }
            }
            row.push(Some(best));
        }

        // Vertical growth
        for j in 0..axis {
            for vj in 0..sizes[j] {
                for v in 0..size {
                    if covered[j][vj][v] {
                        continue;
                    }
                    match rows.iter_mut().find(|row| row[axis] == Some(v) && row[j].is_none()) {
                        Some(row) => row[j] = Some(vj),
                        None => {
                            let mut row = vec![None; axis + 1];
                            row[j] = Some(vj);
                            row[axis] = Some(v);
                            rows.push(row);
                        }
                    }
                    covered[j][vj][v] = true;
                }
            }
        }
    }

    rows.into_iter()
        .map(|row| row.into_iter().map(|v| v.unwrap_or(0)).collect())
        .collect()
}

/// Concrete parameter points for a set of axes
pub fn enumerate(axes: &[ParameterAxis], mode: CombinationMode) -> Result<Vec<ParameterPoint>, HarnessError> {
    for (i, axis) in axes.iter().enumerate() {
        axis.validate()?;
        if axes[..i].iter().any(|other| other.name == axis.name) {
            return Err(HarnessError::MalformedAxis {
                axis: axis.name.clone(),
                reason: "declared twice".to_string(),
            });
        }
    }

    let sizes: Vec<usize> = axes.iter().map(ParameterAxis::len).collect();
    let rows = match mode {
        CombinationMode::Exhaustive => exhaustive(&sizes),
        CombinationMode::Pairwise => pairwise(&sizes),
    };
    debug!("{:?} enumeration of {:?} gives {} points", mode, sizes, rows.len());

    Ok(rows
        .into_iter()
        .map(|row| {
            ParameterPoint::new(
                axes.iter()
                    .zip(row)
                    .map(|(axis, index)| (axis.name.clone(), axis.values[index].clone()))
                    .collect(),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisValue;

    fn covers_all_pairs(sizes: &[usize], rows: &[Vec<usize>]) -> bool {
        for a in 0..sizes.len() {
            for b in a + 1..sizes.len() {
                for va in 0..sizes[a] {
                    for vb in 0..sizes[b] {
                        if !rows.iter().any(|row| row[a] == va && row[b] == vb) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }

    #[test]
    fn test_exhaustive_order() {
        assert_eq!(exhaustive(&[2, 3]), vec![
            vec![0, 0], vec![0, 1], vec![0, 2],
            vec![1, 0], vec![1, 1], vec![1, 2],
        ]);
        assert_eq!(exhaustive(&[]), vec![Vec::<usize>::new()]);
        assert!(exhaustive(&[3, 0]).is_empty());
    }

    #[test]
    fn test_pairwise_covers_every_pair() {
        for sizes in [vec![3, 3, 3], vec![3, 3, 5, 3], vec![2, 7, 3, 4, 2], vec![5, 1, 3, 3], vec![10, 10, 2, 2, 2, 2]] {
            let rows = pairwise(&sizes);
            assert!(covers_all_pairs(&sizes, &rows), "{:?}", sizes);
            for row in &rows {
                assert!(row.iter().zip(&sizes).all(|(v, s)| v < s));
            }
        }
    }

    #[test]
    fn test_pairwise_is_smaller_than_cross_product() {
        let sizes = [3, 3, 5, 3];
        let rows = pairwise(&sizes);
        assert!(rows.len() < 135);
        assert!(rows.len() >= 15);
        assert_eq!(rows, pairwise(&sizes));
    }

    #[test]
    fn test_enumerate_points() {
        let axes = vec![
            ParameterAxis::labels("scheme", &["QPSK", "QAM16"]),
            ParameterAxis::integers("n", [257, 997]),
        ];
        let points = enumerate(&axes, CombinationMode::Exhaustive).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[1].label("scheme").unwrap(), "QPSK");
        assert_eq!(points[1].int("n").unwrap(), 997);

        let single = enumerate(&axes[..1], CombinationMode::Pairwise).unwrap();
        assert_eq!(single.len(), 2);
        assert_eq!(enumerate(&[], CombinationMode::Exhaustive).unwrap().len(), 1);
    }

    #[test]
    fn test_enumerate_rejects_bad_axes() {
        let twice = vec![ParameterAxis::integers("n", [1]), ParameterAxis::integers("n", [2])];
        assert!(enumerate(&twice, CombinationMode::Exhaustive).is_err());
        let empty = vec![ParameterAxis::new("n", crate::axis::AxisKind::Integer, Vec::<AxisValue>::new())];
        assert!(enumerate(&empty, CombinationMode::Pairwise).is_err());
    }
}
