//! Clustering of near-duplicate rectangles
//!
//! A correlation surface lights up a small blob of positions around every
//! true target. Grouping collapses each blob into one averaged rectangle.

use super::types::Rectangle;

/// Merge similar rectangles into averaged representatives.
///
/// Two rectangles are similar when every edge differs by at most
/// `eps * (min(w1, w2) + min(h1, h2)) / 2`. Similarity is closed
/// transitively, each class is averaged, and classes with fewer than
/// `min_group_size` members are dropped. A class lying inside another
/// class (grown by `eps` of its size) is dropped in favour of the heavier
/// one, or the earlier one on a tie.
///
/// Output order follows the first member of each class in `rects`.
pub fn group_rectangles(rects: &[Rectangle], min_group_size: usize, eps: f64) -> Vec<Rectangle> {
    if rects.is_empty() {
        return Vec::new();
    }

    let mut sets = DisjointSet::new(rects.len());
    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                sets.union(i, j);
            }
        }
    }

    // label classes in order of first appearance
    let mut label_of_root = vec![usize::MAX; rects.len()];
    let mut sums: Vec<[i64; 4]> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = sets.find(i);
        if label_of_root[root] == usize::MAX {
            label_of_root[root] = sums.len();
            sums.push([0; 4]);
            counts.push(0);
        }
        let label = label_of_root[root];
        sums[label][0] += r.x as i64;
        sums[label][1] += r.y as i64;
        sums[label][2] += r.w as i64;
        sums[label][3] += r.h as i64;
        counts[label] += 1;
    }

    let classes: Vec<(Rectangle, usize)> = sums
        .iter()
        .zip(&counts)
        .filter(|&(_, &n)| n >= min_group_size)
        .map(|(s, &n)| {
            let avg = |v: i64| (v as f64 / n as f64).round() as i32;
            (Rectangle::new(avg(s[0]), avg(s[1]), avg(s[2]), avg(s[3])), n)
        })
        .collect();

    log::debug!(
        "🧩 Grouped {} rectangles into {} classes ({} kept by size)",
        rects.len(),
        sums.len(),
        classes.len()
    );

    classes
        .iter()
        .enumerate()
        .filter(|&(i, &(r1, n1))| {
            !classes.iter().enumerate().any(|(j, &(r2, n2))| {
                j != i && nested(&r1, &r2, eps) && (n2 > n1 || (n2 == n1 && j < i))
            })
        })
        .map(|(_, &(r, _))| r)
        .collect()
}

fn similar(a: &Rectangle, b: &Rectangle, eps: f64) -> bool {
    let delta = eps * (a.w.min(b.w) + a.h.min(b.h)) as f64 * 0.5;
    let close = |p: i32, q: i32| ((p - q).abs() as f64) <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.w, b.x + b.w)
        && close(a.y + a.h, b.y + b.h)
}

/// `inner` fits inside `outer` grown by `eps` of its size on each side
fn nested(inner: &Rectangle, outer: &Rectangle, eps: f64) -> bool {
    let dx = (outer.w as f64 * eps).round() as i32;
    let dy = (outer.h as f64 * eps).round() as i32;
    inner.x >= outer.x - dx
        && inner.y >= outer.y - dy
        && inner.x + inner.w <= outer.x + outer.w + dx
        && inner.y + inner.h <= outer.y + outer.h + dy
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // keep the lower index as root so labels stay in input order
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}
