//! Locality-sensitive hashing index over binary descriptors
//!
//! Each table hashes a descriptor by a fixed random subset of its bits.
//! Queries probe their own bucket plus every bucket one bit flip away.

use super::orb::Descriptor;
use crate::error::{VisionError, VisionResult};
use rand::{SeedableRng, rngs::StdRng, seq::index};
use std::collections::HashMap;

const INDEX_SEED: u64 = 0x15_4a5b;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: u32,
}

pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

struct HashTable {
    bits: Vec<usize>,
    buckets: HashMap<u32, Vec<usize>>,
}

impl HashTable {
    fn key(&self, descriptor: &Descriptor) -> u32 {
        self.bits
            .iter()
            .enumerate()
            .filter(|&(_, &bit)| (descriptor[bit / 8] >> (bit % 8)) & 1 == 1)
            .fold(0u32, |key, (k, _)| key | (1u32 << k))
    }
}

pub struct LshIndex<'a> {
    data: &'a [Descriptor],
    tables: Vec<HashTable>,
    key_size: usize,
}

impl<'a> LshIndex<'a> {
    /// Build `table_number` tables with `key_size`-bit keys over `data`.
    ///
    /// Fails when there is nothing to index.
    pub fn build(data: &'a [Descriptor], table_number: usize, key_size: usize) -> VisionResult<Self> {
        if data.is_empty() {
            return Err(VisionError::MatchIndex {
                reason: "no haystack descriptors to index".to_string(),
            });
        }
        if key_size == 0 || key_size > 32 {
            return Err(VisionError::MatchIndex {
                reason: format!("key size {key_size} outside 1..=32"),
            });
        }

        let mut rng = StdRng::seed_from_u64(INDEX_SEED);
        let tables = (0..table_number)
            .map(|_| {
                let mut table = HashTable {
                    bits: index::sample(&mut rng, data[0].len() * 8, key_size).into_vec(),
                    buckets: HashMap::new(),
                };
                for (i, descriptor) in data.iter().enumerate() {
                    let key = table.key(descriptor);
                    table.buckets.entry(key).or_default().push(i);
                }
                table
            })
            .collect();

        Ok(Self {
            data,
            tables,
            key_size,
        })
    }

    /// Up to `k` nearest candidates, closest first. Ties go to the lower index.
    pub fn knn(&self, query: &Descriptor, k: usize) -> Vec<Neighbor> {
        let mut seen = vec![false; self.data.len()];
        let mut found: Vec<Neighbor> = Vec::new();

        for table in &self.tables {
            let key = table.key(query);
            let probes = std::iter::once(key).chain((0..self.key_size).map(|bit| key ^ (1u32 << bit)));
            for probe in probes {
                let Some(bucket) = table.buckets.get(&probe) else {
                    continue;
                };
                for &i in bucket {
                    if !seen[i] {
                        seen[i] = true;
                        found.push(Neighbor {
                            index: i,
                            distance: hamming(query, &self.data[i]),
                        });
                    }
                }
            }
        }

        found.sort_by_key(|n| (n.distance, n.index));
        found.truncate(k);
        found
    }
}
