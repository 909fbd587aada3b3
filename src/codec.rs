//! Canonical wire encoding for transactions
//!
//! The byte layout is the consensus format: it feeds the id hash and the
//! signing payload, so encoding must be deterministic — same logical
//! transaction, same bytes. Layout, in order: one type byte, the
//! variant's exclusive fields, the inputs, the outputs, the witness
//! scripts. Arrays carry compact-size length prefixes; integers are
//! little-endian.
//!
//! Two encodings share this prefix: the full form carries all five
//! sections, the unsigned form stops after the outputs and exists only
//! for hashing and signing.

use crate::constants::*;
use crate::error::{FormatError, Result};
use crate::transaction::{Transaction, TransactionKind};
use crate::types::*;

/// Sequential reader over a byte slice with position tracking for
/// error reporting.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < n {
            return Err(FormatError::UnexpectedEof(self.pos));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(i64::from_le_bytes(bytes))
    }

    fn read_hash256(&mut self) -> Result<Hash256> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(self.take(32)?);
        Ok(hash)
    }

    fn read_hash160(&mut self) -> Result<Hash160> {
        let mut hash = [0u8; 20];
        hash.copy_from_slice(self.take(20)?);
        Ok(hash)
    }

    /// Compact-size length prefix: one byte below 0xfd, otherwise an
    /// 0xfd/0xfe/0xff marker followed by a u16/u32/u64.
    fn read_varint(&mut self) -> Result<u64> {
        match self.read_u8()? {
            n @ 0x00..=0xfc => Ok(n as u64),
            0xfd => Ok(self.read_u16()? as u64),
            0xfe => Ok(self.read_u32()? as u64),
            0xff => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(self.take(8)?);
                Ok(u64::from_le_bytes(bytes))
            }
        }
    }
}

fn write_varint(out: &mut Vec<u8>, value: u64) {
    match value {
        0x00..=0xfc => out.push(value as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

fn write_input(out: &mut Vec<u8>, input: &TxInput) {
    out.extend_from_slice(&input.prev_hash);
    out.extend_from_slice(&input.prev_index.to_le_bytes());
}

fn write_output(out: &mut Vec<u8>, output: &TxOutput) {
    out.extend_from_slice(&output.asset_id);
    out.extend_from_slice(&output.value.raw().to_le_bytes());
    out.extend_from_slice(&output.script_hash);
}

/// Variant-exclusive fields, keyed by the type byte already written.
fn write_exclusive(out: &mut Vec<u8>, kind: &TransactionKind) {
    match kind {
        TransactionKind::Transfer | TransactionKind::Issue => {}
        TransactionKind::Mint { nonce } => {
            out.extend_from_slice(&nonce.to_le_bytes());
        }
        TransactionKind::Register(reg) => {
            out.extend_from_slice(&reg.total_supply.raw().to_le_bytes());
            out.push(reg.precision);
            out.extend_from_slice(&reg.issuer);
            out.extend_from_slice(&reg.admin);
        }
        TransactionKind::Claim { claims } => {
            write_varint(out, claims.len() as u64);
            for claim in claims {
                write_input(out, claim);
            }
        }
    }
}

/// The shared prefix of both encodings: type byte, exclusive fields,
/// inputs, outputs.
fn write_unsigned(out: &mut Vec<u8>, tx: &Transaction) {
    out.push(tx.kind().discriminant());
    write_exclusive(out, tx.kind());

    write_varint(out, tx.inputs().len() as u64);
    for input in tx.inputs() {
        write_input(out, input);
    }

    write_varint(out, tx.outputs().len() as u64);
    for output in tx.outputs() {
        write_output(out, output);
    }
}

/// Full wire encoding, witness scripts included.
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    let mut out = Vec::new();
    write_unsigned(&mut out, tx);

    write_varint(&mut out, tx.witnesses().len() as u64);
    for witness in tx.witnesses() {
        write_varint(&mut out, witness.len() as u64);
        out.extend_from_slice(witness);
    }
    out
}

/// Unsigned encoding: stops after the outputs. Used only for hashing
/// and signing, never for storage or relay of complete transactions.
pub fn encode_transaction_unsigned(tx: &Transaction) -> Vec<u8> {
    let mut out = Vec::new();
    write_unsigned(&mut out, tx);
    out
}

fn read_input(r: &mut Reader<'_>) -> Result<TxInput> {
    Ok(TxInput {
        prev_hash: r.read_hash256()?,
        prev_index: r.read_u16()?,
    })
}

fn read_inputs(r: &mut Reader<'_>, limit: usize) -> Result<Vec<TxInput>> {
    let count = r.read_varint()?;
    if count > limit as u64 {
        return Err(FormatError::TooManyInputs(count));
    }
    let mut inputs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        inputs.push(read_input(r)?);
    }
    Ok(inputs)
}

/// Exclusive-field decoder: the closed dispatch table from type byte to
/// variant. An unknown byte is a format error, never a fallback.
fn read_kind(r: &mut Reader<'_>) -> Result<TransactionKind> {
    match r.read_u8()? {
        0x00 => Ok(TransactionKind::Transfer),
        0x01 => Ok(TransactionKind::Mint {
            nonce: r.read_u32()?,
        }),
        0x02 => Ok(TransactionKind::Issue),
        0x03 => Ok(TransactionKind::Register(AssetRegistration {
            total_supply: Fixed8::from_raw(r.read_i64()?),
            precision: r.read_u8()?,
            issuer: r.read_hash160()?,
            admin: r.read_hash160()?,
        })),
        0x04 => Ok(TransactionKind::Claim {
            claims: read_inputs(r, MAX_TX_CLAIMS)?,
        }),
        other => Err(FormatError::UnknownTransactionType(other)),
    }
}

/// Decodes a full transaction record.
///
/// Rejects unknown type bytes, truncated or trailing data, duplicate
/// inputs, zero-value outputs, and oversized arrays. A rejection aborts
/// this record only; no other state is affected.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut r = Reader::new(bytes);

    let kind = read_kind(&mut r)?;
    let inputs = read_inputs(&mut r, MAX_TX_INPUTS)?;

    let output_count = r.read_varint()?;
    if output_count > MAX_TX_OUTPUTS as u64 {
        return Err(FormatError::TooManyOutputs(output_count));
    }
    let mut outputs = Vec::with_capacity(output_count as usize);
    for _ in 0..output_count {
        outputs.push(TxOutput {
            asset_id: r.read_hash256()?,
            value: Fixed8::from_raw(r.read_i64()?),
            script_hash: r.read_hash160()?,
        });
    }

    let witness_count = r.read_varint()?;
    if witness_count > MAX_WITNESS_SCRIPTS as u64 {
        return Err(FormatError::TooManyWitnesses(witness_count));
    }
    let mut witnesses = Vec::with_capacity(witness_count as usize);
    for _ in 0..witness_count {
        let len = r.read_varint()?;
        if len > MAX_WITNESS_SIZE as u64 {
            return Err(FormatError::OversizedWitness(len));
        }
        witnesses.push(r.take(len as usize)?.to_vec());
    }

    if r.remaining() != 0 {
        return Err(FormatError::TrailingData(r.remaining()));
    }

    // Transaction::new re-checks duplicates and zero values so decoded
    // and built transactions share one set of invariants.
    Transaction::new(kind, inputs, outputs, witnesses)
}
