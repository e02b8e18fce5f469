use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::io::{self, Read, Seek};

use log::{debug, trace};

use crate::bitio::BitReader;
use crate::{ALPHABET_SIZE, BITS_PER_WORD, PSEUDO_EOF};

/// Symbol id: byte values 0..=255 plus `PSEUDO_EOF`.
pub type Symbol = u16;
pub type Histogram = [u64; ALPHABET_SIZE];
pub type CodeTable = HashMap<Symbol, String>;

/// Prefix-code tree node. Internal nodes carry no symbol at all, so they can
/// never be mistaken for a real symbol or for end-of-stream.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Node {
    Leaf {
        symbol: Symbol,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn leaf(symbol: Symbol, weight: u64) -> Self {
        Node::Leaf { symbol, weight }
    }

    pub fn internal(left: Node, right: Node) -> Self {
        Node::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight,
        }
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            Node::Leaf { symbol, .. } => Some(*symbol),
            Node::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Queue entry. `seq` is the insertion order and breaks weight ties FIFO.
#[derive(Eq, PartialEq)]
struct HeapNode {
    weight: u64,
    seq: u32,
    node: Node,
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .weight
            .cmp(&self.weight)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reads 8-bit units until the source is exhausted. The caller must `reset`
/// the reader before reading it again.
pub fn count_frequencies<R: Read + Seek>(input: &mut BitReader<R>) -> io::Result<Histogram> {
    let mut histogram = [0u64; ALPHABET_SIZE];
    while let Some(byte) = input.read_bits(BITS_PER_WORD)? {
        histogram[byte as usize] += 1;
    }
    debug!(
        "Counted {} bytes, {} distinct values",
        histogram.iter().sum::<u64>(),
        histogram.iter().filter(|&&c| c > 0).count()
    );
    Ok(histogram)
}

/// Greedy weighted merge over every byte with a nonzero count plus the
/// end-of-stream symbol at weight 1.
///
/// Leaves enter the queue in ascending symbol order with `PSEUDO_EOF` last;
/// equal weights leave the queue in the order they entered it. The first node
/// removed becomes the left child.
pub fn build_huffman_tree(histogram: &Histogram) -> Node {
    let mut heap = BinaryHeap::with_capacity(ALPHABET_SIZE + 1);
    let mut seq = 0u32;
    let mut push = |heap: &mut BinaryHeap<HeapNode>, node: Node| {
        heap.push(HeapNode {
            weight: node.weight(),
            seq,
            node,
        });
        seq += 1;
    };

    for (byte, &count) in histogram.iter().enumerate() {
        if count > 0 {
            push(&mut heap, Node::leaf(byte as Symbol, count));
        }
    }
    push(&mut heap, Node::leaf(PSEUDO_EOF, 1));
    debug!("Building Huffman tree from {} leaves", heap.len());

    // The EOF leaf guarantees at least one entry, so the loop always ends by
    // finding a lone root.
    let mut root = Node::leaf(PSEUDO_EOF, 1);
    while let Some(left) = heap.pop() {
        let Some(right) = heap.pop() else {
            root = left.node;
            break;
        };
        push(&mut heap, Node::internal(left.node, right.node));
    }
    debug!(
        "Tree complete: weight {}, depth {}",
        root.weight(),
        root.depth()
    );
    root
}

/// Maps each leaf symbol to its root-to-leaf path ("0" left, "1" right).
///
/// A root that is itself a leaf gets the one-bit code "0" so that every
/// symbol, including a lone end-of-stream, occupies at least one bit.
pub fn build_code_table(root: &Node) -> CodeTable {
    let mut table = CodeTable::new();
    match root {
        Node::Leaf { symbol, .. } => {
            table.insert(*symbol, String::from("0"));
        }
        Node::Internal { .. } => assign_codes(root, String::new(), &mut table),
    }
    debug!("Code table built with {} entries", table.len());
    table
}

fn assign_codes(node: &Node, prefix: String, table: &mut CodeTable) {
    match node {
        Node::Leaf { symbol, .. } => {
            trace!("Assigning code to symbol {:#05x}: '{}'", symbol, prefix);
            table.insert(*symbol, prefix);
        }
        Node::Internal { left, right, .. } => {
            assign_codes(left, format!("{}0", prefix), table);
            assign_codes(right, format!("{}1", prefix), table);
        }
    }
}

/// Shannon entropy of the byte distribution, in bits per symbol.
pub fn entropy_from_histogram(histogram: &Histogram) -> f64 {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total_f = total as f64;

    histogram
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total_f;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn histogram_of(data: &[u8]) -> Histogram {
        let mut histogram = [0u64; ALPHABET_SIZE];
        for &b in data {
            histogram[b as usize] += 1;
        }
        histogram
    }

    #[test]
    fn counts_every_byte() {
        let mut reader = BitReader::new(Cursor::new(b"AAAB".to_vec()));
        let histogram = count_frequencies(&mut reader).unwrap();
        assert_eq!(histogram[b'A' as usize], 3);
        assert_eq!(histogram[b'B' as usize], 1);
        assert_eq!(histogram.iter().sum::<u64>(), 4);
    }

    #[test]
    fn aaab_tree_shape_and_codes() {
        let root = build_huffman_tree(&histogram_of(b"AAAB"));
        assert_eq!(root.weight(), 5);

        let expected = Node::internal(
            Node::internal(
                Node::leaf(b'B' as Symbol, 1),
                Node::leaf(PSEUDO_EOF, 1),
            ),
            Node::leaf(b'A' as Symbol, 3),
        );
        assert_eq!(root, expected);

        let table = build_code_table(&root);
        assert_eq!(table[&(b'A' as Symbol)], "1");
        assert_eq!(table[&(b'B' as Symbol)], "00");
        assert_eq!(table[&PSEUDO_EOF], "01");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn empty_histogram_gives_lone_eof_leaf() {
        let root = build_huffman_tree(&[0u64; ALPHABET_SIZE]);
        assert_eq!(root, Node::leaf(PSEUDO_EOF, 1));

        let table = build_code_table(&root);
        assert_eq!(table.len(), 1);
        assert_eq!(table[&PSEUDO_EOF], "0");
    }

    #[test]
    fn equal_weights_merge_in_insertion_order() {
        let root = build_huffman_tree(&histogram_of(b"abc"));
        // a,b merge first; c,EOF second; then the two pairs in that order.
        let expected = Node::internal(
            Node::internal(Node::leaf(b'a' as Symbol, 1), Node::leaf(b'b' as Symbol, 1)),
            Node::internal(Node::leaf(b'c' as Symbol, 1), Node::leaf(PSEUDO_EOF, 1)),
        );
        assert_eq!(root, expected);
    }

    #[test]
    fn codes_are_prefix_free() {
        let data: Vec<u8> = (0..=255u8)
            .flat_map(|b| std::iter::repeat_n(b, (b as usize % 17) + 1))
            .collect();
        let table = build_code_table(&build_huffman_tree(&histogram_of(&data)));
        assert_eq!(table.len(), 257);

        let codes: Vec<&String> = table.values().collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "{} prefixes {}", a, b);
                }
            }
        }
    }

    #[test]
    fn frequent_symbols_get_shorter_codes() {
        let mut data = vec![b'e'; 1000];
        data.extend_from_slice(b"xyz");
        let table = build_code_table(&build_huffman_tree(&histogram_of(&data)));
        let e = table[&(b'e' as Symbol)].len();
        for s in [b'x', b'y', b'z'] {
            assert!(e < table[&(s as Symbol)].len());
        }
    }

    #[test]
    fn tree_leaves_cover_alphabet_used() {
        let root = build_huffman_tree(&histogram_of(b"hello world"));
        // h e l o ' ' w r d + EOF
        assert_eq!(root.leaf_count(), 9);
        assert_eq!(root.weight(), 12);
    }

    #[test]
    fn entropy_of_uniform_and_constant_input() {
        assert_eq!(entropy_from_histogram(&[0u64; ALPHABET_SIZE]), 0.0);
        assert_eq!(entropy_from_histogram(&histogram_of(b"aaaa")), 0.0);
        let e = entropy_from_histogram(&histogram_of(b"abcd"));
        assert!((e - 2.0).abs() < 1e-12);
    }
}
