//! Pure functions converting between logical identifiers (user-key,
//! replica-id, sequence) and the four on-disk key families (§3, §4.1).
//!
//! Every family reserves its leading byte as a tag so a single byte-lex
//! comparator sorts all four families apart from one another, and the
//! zero-padded decimal fields inside each family make lexicographic order
//! coincide with numeric order (§6, §9). Malformed inputs in the fixed-width
//! slots are programming errors, not data errors: this layer must never see
//! user-controlled bytes in the `seq`/`replica_id` positions.

use crate::types::{ReplicaId, Seq};

pub const SEQLEN: usize = 15;
pub const IDLEN: usize = 10;

const STAMPED_TAG: u8 = b'!';
const LSEQ_INDEX_TAG: u8 = b'#';
const REVERSE_TAG: u8 = b'@';

fn pad(n: u64, width: usize) -> Vec<u8> {
    format!("{n:0width$}").into_bytes()
}

fn parse_padded(bytes: &[u8]) -> u64 {
    std::str::from_utf8(bytes)
        .expect("padded field must be ASCII decimal")
        .parse()
        .expect("padded field must be ASCII decimal")
}

/// Current-pointer family: `pad(replicaId, IDLEN) ⧺ userKey`. The first
/// digit of the padded id doubles as the family tag (any replica id that
/// fits in `IDLEN - 1` decimal digits leaves it `'0'`, so it never collides
/// with `!`, `#` or `@`).
pub fn encode_current(user_key: &[u8], replica_id: ReplicaId) -> Vec<u8> {
    let mut out = pad(replica_id as u64, IDLEN);
    out.extend_from_slice(user_key);
    out
}

/// Reverse-pointer family: replaces the leading family byte of a
/// current-key with `'@'`, preserving the rest untouched. Because the
/// current-key's leading digit is always `'0'` (§3's `IDLEN` reserves it as
/// a tag slot), this reproduces `'@' ⧺ pad(replicaId, IDLEN-1) ⧺ userKey`.
pub fn encode_reverse(current_key: &[u8]) -> Vec<u8> {
    let mut out = current_key.to_vec();
    out[0] = REVERSE_TAG;
    out
}

/// LSEQ-index family: `'#' ⧺ pad(replicaId, IDLEN-1) ⧺ pad(seq, SEQLEN)`.
pub fn encode_lseq_index(seq: Seq, replica_id: ReplicaId) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + (IDLEN - 1) + SEQLEN);
    out.push(LSEQ_INDEX_TAG);
    out.extend(pad(replica_id as u64, IDLEN - 1));
    out.extend(pad(seq, SEQLEN));
    out
}

/// Stamped-key family: `'!' ⧺ userKey ⧺ pad(seq, SEQLEN) ⧺ pad(replicaId, IDLEN)`.
pub fn encode_stamped(user_key: &[u8], seq: Seq, replica_id: ReplicaId) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + user_key.len() + SEQLEN + IDLEN);
    out.push(STAMPED_TAG);
    out.extend_from_slice(user_key);
    out.extend(pad(seq, SEQLEN));
    out.extend(pad(replica_id as u64, IDLEN));
    out
}

/// Is `key` a member of the LSEQ-index family?
pub fn is_lseq_index_key(key: &[u8]) -> bool {
    key.first() == Some(&LSEQ_INDEX_TAG)
}

/// Is `key` a member of the stamped-key family?
pub fn is_stamped_key(key: &[u8]) -> bool {
    key.first() == Some(&STAMPED_TAG)
}

/// Extract `replicaId` from an LSEQ-index key (bytes 1..IDLEN).
pub fn lseq_index_replica_id(key: &[u8]) -> ReplicaId {
    parse_padded(&key[1..IDLEN]) as ReplicaId
}

/// Extract `seq` from an LSEQ-index key (bytes IDLEN..IDLEN+SEQLEN).
pub fn lseq_index_seq(key: &[u8]) -> Seq {
    parse_padded(&key[IDLEN..IDLEN + SEQLEN])
}

/// Extract `(userKey, seq, replicaId)` from a stamped key, whose layout ends
/// with fixed-width `seq` then `replicaId` fields.
pub fn parse_stamped(key: &[u8]) -> (&[u8], Seq, ReplicaId) {
    let len = key.len();
    let replica_start = len - IDLEN;
    let seq_start = replica_start - SEQLEN;
    let user_key = &key[1..seq_start];
    let seq = parse_padded(&key[seq_start..replica_start]);
    let replica_id = parse_padded(&key[replica_start..len]) as ReplicaId;
    (user_key, seq, replica_id)
}

/// Rewrites a stamped key's family prefix to produce the corresponding
/// current-key: strips `'!'` and the trailing `seq ⧺ replicaId` suffix,
/// replacing them with the digit-id prefix.
pub fn stamped_current_from_stamped(stamped: &[u8]) -> Vec<u8> {
    let (user_key, _seq, replica_id) = parse_stamped(stamped);
    encode_current(user_key, replica_id)
}

/// Extract `userKey` from a current-pointer key (bytes IDLEN..).
pub fn user_key_from_current(current_key: &[u8]) -> &[u8] {
    &current_key[IDLEN..]
}
