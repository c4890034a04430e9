//! Bit-vectors of BDD functions.
//!
//! A [`BitVec`] is a fixed-width vector of boolean functions, least
//! significant bit first. Arithmetic is bit-blasted through the owning
//! [`Bdd`] manager, in the same manager-centric style as the boolean
//! operations. Unless noted otherwise, binary operations require both
//! operands to have the same width; callers align widths first with
//! [`Bdd::bv_resize`].

use log::debug;

use crate::bdd::Bdd;
use crate::reference::Ref;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitVec {
    bits: Vec<Ref>,
    signed: bool,
}

impl BitVec {
    pub fn new(bits: Vec<Ref>, signed: bool) -> Self {
        assert!(!bits.is_empty(), "Bit-vector must have at least one bit");
        Self { bits, signed }
    }

    pub fn width(&self) -> u32 {
        self.bits.len() as u32
    }

    pub fn bits(&self) -> &[Ref] {
        &self.bits
    }

    pub fn bit(&self, index: u32) -> Ref {
        self.bits[index as usize]
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn msb(&self) -> Ref {
        self.bits[self.bits.len() - 1]
    }

    pub fn with_signed(self, signed: bool) -> Self {
        Self { signed, ..self }
    }
}

impl Bdd {
    /// Constant bit-vector holding the low `width` bits of `value`.
    pub fn bv_constant(&self, value: u64, width: u32, signed: bool) -> BitVec {
        let bits = (0..width)
            .map(|i| self.constant(i < 64 && (value >> i) & 1 == 1))
            .collect();
        BitVec::new(bits, signed)
    }

    /// Fresh bit-vector over the variables `first..first + width`.
    pub fn bv_variable(&self, first: u32, width: u32, signed: bool) -> BitVec {
        let bits = (first..first + width).map(|v| self.mk_var(v)).collect();
        BitVec::new(bits, signed)
    }

    /// The raw value of a bit-vector whose bits are all terminals.
    pub fn bv_as_constant(&self, a: &BitVec) -> Option<u64> {
        let mut value = 0u64;
        for (i, &bit) in a.bits.iter().enumerate() {
            if self.is_one(bit) {
                if i >= 64 {
                    return None;
                }
                value |= 1 << i;
            } else if !self.is_zero(bit) {
                return None;
            }
        }
        Some(value)
    }

    /// Truncate or extend to `width`, sign-extending signed vectors.
    pub fn bv_resize(&self, a: &BitVec, width: u32) -> BitVec {
        let fill = if a.signed { a.msb() } else { self.zero };
        let bits = (0..width as usize)
            .map(|i| a.bits.get(i).copied().unwrap_or(fill))
            .collect();
        BitVec::new(bits, a.signed)
    }

    /// Bits `low..=high` of `a`, as an unsigned vector.
    pub fn bv_extract(&self, a: &BitVec, high: u32, low: u32) -> BitVec {
        assert!(low <= high && high < a.width(), "Invalid extract [{}:{}]", high, low);
        BitVec::new(a.bits[low as usize..=high as usize].to_vec(), false)
    }

    pub fn bv_ite(&self, cond: Ref, a: &BitVec, b: &BitVec) -> BitVec {
        let bits = zip_bits(a, b)
            .map(|(x, y)| self.apply_ite(cond, x, y))
            .collect();
        BitVec::new(bits, a.signed)
    }

    pub fn bv_and(&self, a: &BitVec, b: &BitVec) -> BitVec {
        let bits = zip_bits(a, b).map(|(x, y)| self.apply_and(x, y)).collect();
        BitVec::new(bits, a.signed && b.signed)
    }

    pub fn bv_or(&self, a: &BitVec, b: &BitVec) -> BitVec {
        let bits = zip_bits(a, b).map(|(x, y)| self.apply_or(x, y)).collect();
        BitVec::new(bits, a.signed && b.signed)
    }

    pub fn bv_xor(&self, a: &BitVec, b: &BitVec) -> BitVec {
        let bits = zip_bits(a, b).map(|(x, y)| self.apply_xor(x, y)).collect();
        BitVec::new(bits, a.signed && b.signed)
    }

    /// OR over all bits: the vector is non-zero.
    pub fn bv_reduce_or(&self, a: &BitVec) -> Ref {
        self.apply_or_many(a.bits.iter().copied())
    }

    fn ripple_add(&self, a: &[Ref], b: &[Ref], carry_in: Ref) -> Vec<Ref> {
        let mut carry = carry_in;
        let mut sum = Vec::with_capacity(a.len());
        for (&x, &y) in a.iter().zip(b) {
            sum.push(self.apply_xor(self.apply_xor(x, y), carry));
            carry = self.apply_ite(x, self.apply_or(y, carry), self.apply_and(y, carry));
        }
        sum
    }

    pub fn bv_add(&self, a: &BitVec, b: &BitVec) -> BitVec {
        check_widths(a, b);
        let bits = self.ripple_add(&a.bits, &b.bits, self.zero);
        BitVec::new(bits, a.signed && b.signed)
    }

    pub fn bv_sub(&self, a: &BitVec, b: &BitVec) -> BitVec {
        check_widths(a, b);
        let not_b: Vec<Ref> = b.bits.iter().map(|&x| -x).collect();
        let bits = self.ripple_add(&a.bits, &not_b, self.one);
        BitVec::new(bits, a.signed && b.signed)
    }

    /// Two's complement negation.
    pub fn bv_neg(&self, a: &BitVec) -> BitVec {
        let zero = self.bv_constant(0, a.width(), a.signed);
        self.bv_sub(&zero, a).with_signed(a.signed)
    }

    /// Product truncated to the operand width.
    pub fn bv_mul(&self, a: &BitVec, b: &BitVec) -> BitVec {
        check_widths(a, b);
        let w = a.bits.len();
        let mut acc = vec![self.zero; w];
        for (i, &bi) in b.bits.iter().enumerate() {
            if self.is_zero(bi) {
                continue;
            }
            let partial: Vec<Ref> = (0..w)
                .map(|j| {
                    if j < i {
                        self.zero
                    } else {
                        self.apply_and(a.bits[j - i], bi)
                    }
                })
                .collect();
            acc = self.ripple_add(&acc, &partial, self.zero);
        }
        BitVec::new(acc, a.signed && b.signed)
    }

    /// Restoring unsigned division. Division by zero yields an all-ones
    /// quotient and the dividend as remainder.
    pub fn bv_udivrem(&self, a: &BitVec, b: &BitVec) -> (BitVec, BitVec) {
        check_widths(a, b);
        let w = a.bits.len();
        debug!("bv_udivrem(width = {})", w);

        let mut divisor = b.bits.clone();
        divisor.push(self.zero);
        let not_divisor: Vec<Ref> = divisor.iter().map(|&x| -x).collect();

        let mut rem = vec![self.zero; w + 1];
        let mut quotient = vec![self.zero; w];
        for i in (0..w).rev() {
            rem.pop();
            rem.insert(0, a.bits[i]);
            let less = self.ult_bits(&rem, &divisor);
            let diff = self.ripple_add(&rem, &not_divisor, self.one);
            rem = rem
                .iter()
                .zip(&diff)
                .map(|(&r, &d)| self.apply_ite(less, r, d))
                .collect();
            quotient[i] = -less;
        }
        rem.truncate(w);

        (BitVec::new(quotient, false), BitVec::new(rem, false))
    }

    /// Signed division truncating toward zero; the remainder takes the sign
    /// of the dividend.
    pub fn bv_sdivrem(&self, a: &BitVec, b: &BitVec) -> (BitVec, BitVec) {
        check_widths(a, b);
        let sa = a.msb();
        let sb = b.msb();
        let abs_a = self.bv_ite(sa, &self.bv_neg(a), a);
        let abs_b = self.bv_ite(sb, &self.bv_neg(b), b);
        let (q, r) = self.bv_udivrem(&abs_a, &abs_b);
        let q = self.bv_ite(self.apply_xor(sa, sb), &self.bv_neg(&q), &q);
        let r = self.bv_ite(sa, &self.bv_neg(&r), &r);
        (q.with_signed(true), r.with_signed(true))
    }

    /// Barrel shifter. `left` selects the direction; vacated bits are zero.
    fn shift(&self, a: &BitVec, amount: &BitVec, left: bool) -> BitVec {
        let w = a.bits.len();
        let mut cur = a.bits.clone();
        let mut overflow = self.zero;
        for (k, &bit) in amount.bits.iter().enumerate() {
            let step = 1usize.checked_shl(k as u32).filter(|&s| s < w);
            match step {
                Some(step) => {
                    let shifted: Vec<Ref> = (0..w)
                        .map(|j| {
                            let src = if left {
                                j.checked_sub(step)
                            } else {
                                Some(j + step).filter(|&s| s < w)
                            };
                            src.map_or(self.zero, |s| cur[s])
                        })
                        .collect();
                    cur = cur
                        .iter()
                        .zip(&shifted)
                        .map(|(&c, &s)| self.apply_ite(bit, s, c))
                        .collect();
                }
                None => overflow = self.apply_or(overflow, bit),
            }
        }
        let bits = cur.iter().map(|&c| self.apply_and(-overflow, c)).collect();
        BitVec::new(bits, a.signed)
    }

    pub fn bv_shl(&self, a: &BitVec, amount: &BitVec) -> BitVec {
        self.shift(a, amount, true)
    }

    pub fn bv_lshr(&self, a: &BitVec, amount: &BitVec) -> BitVec {
        self.shift(a, amount, false)
    }

    pub fn bv_eq(&self, a: &BitVec, b: &BitVec) -> Ref {
        check_widths(a, b);
        self.apply_and_many(zip_bits(a, b).map(|(x, y)| self.apply_eq(x, y)))
    }

    fn ult_bits(&self, a: &[Ref], b: &[Ref]) -> Ref {
        // Scan from the LSB: the most significant differing bit decides.
        a.iter()
            .zip(b)
            .fold(self.zero, |lt, (&x, &y)| self.apply_ite(self.apply_xor(x, y), y, lt))
    }

    pub fn bv_ult(&self, a: &BitVec, b: &BitVec) -> Ref {
        check_widths(a, b);
        self.ult_bits(&a.bits, &b.bits)
    }

    pub fn bv_ule(&self, a: &BitVec, b: &BitVec) -> Ref {
        -self.bv_ult(b, a)
    }

    pub fn bv_slt(&self, a: &BitVec, b: &BitVec) -> Ref {
        check_widths(a, b);
        // Flipping the sign bits maps two's complement order onto unsigned order.
        let flip = |v: &BitVec| {
            let mut bits = v.bits.clone();
            let last = bits.len() - 1;
            bits[last] = -bits[last];
            bits
        };
        self.ult_bits(&flip(a), &flip(b))
    }

    pub fn bv_sle(&self, a: &BitVec, b: &BitVec) -> Ref {
        -self.bv_slt(b, a)
    }

    /// Bit of `a` at a (possibly symbolic) position. Out-of-range positions
    /// read as zero.
    pub fn bv_select(&self, a: &BitVec, index: &BitVec) -> Ref {
        let index = index.clone().with_signed(false);
        let choices = (0..a.width())
            .filter(|&i| index.width() >= 64 || u64::from(i) >> index.width() == 0)
            .map(|i| {
                let at = self.bv_constant(u64::from(i), index.width(), false);
                self.apply_and(self.bv_eq(&index, &at), a.bit(i))
            })
            .collect::<Vec<_>>();
        self.apply_or_many(choices)
    }
}

fn check_widths(a: &BitVec, b: &BitVec) {
    assert_eq!(a.width(), b.width(), "Bit-vector widths differ");
}

fn zip_bits<'a>(a: &'a BitVec, b: &'a BitVec) -> impl Iterator<Item = (Ref, Ref)> + 'a {
    check_widths(a, b);
    a.bits.iter().copied().zip(b.bits.iter().copied())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn c(bdd: &Bdd, value: u64, width: u32) -> BitVec {
        bdd.bv_constant(value, width, false)
    }

    fn s(bdd: &Bdd, value: i64, width: u32) -> BitVec {
        bdd.bv_constant(value as u64, width, true)
    }

    fn value(bdd: &Bdd, v: &BitVec) -> u64 {
        bdd.bv_as_constant(v).expect("constant")
    }

    #[test]
    fn test_constant_roundtrip() {
        let bdd = Bdd::default();
        assert_eq!(value(&bdd, &c(&bdd, 0xA5, 8)), 0xA5);
        assert_eq!(value(&bdd, &c(&bdd, 0x1FF, 8)), 0xFF);
        let x = bdd.bv_variable(1, 4, false);
        assert_eq!(bdd.bv_as_constant(&x), None);
    }

    #[test]
    fn test_resize() {
        let bdd = Bdd::default();
        assert_eq!(value(&bdd, &bdd.bv_resize(&s(&bdd, -2, 4), 8)), 0xFE);
        assert_eq!(value(&bdd, &bdd.bv_resize(&c(&bdd, 0xE, 4), 8)), 0x0E);
        assert_eq!(value(&bdd, &bdd.bv_resize(&c(&bdd, 0xAB, 8), 4)), 0xB);
    }

    #[test]
    fn test_add_sub_constants() {
        let bdd = Bdd::default();
        assert_eq!(value(&bdd, &bdd.bv_add(&c(&bdd, 200, 8), &c(&bdd, 100, 8))), 44);
        assert_eq!(value(&bdd, &bdd.bv_sub(&c(&bdd, 3, 8), &c(&bdd, 5, 8))), 254);
        assert_eq!(value(&bdd, &bdd.bv_neg(&c(&bdd, 1, 8))), 255);
    }

    #[test]
    fn test_mul_constants() {
        let bdd = Bdd::default();
        assert_eq!(value(&bdd, &bdd.bv_mul(&c(&bdd, 13, 8), &c(&bdd, 11, 8))), 143);
        assert_eq!(value(&bdd, &bdd.bv_mul(&c(&bdd, 20, 8), &c(&bdd, 20, 8))), 400 % 256);
    }

    #[test]
    fn test_udivrem_constants() {
        let bdd = Bdd::default();
        let (q, r) = bdd.bv_udivrem(&c(&bdd, 100, 8), &c(&bdd, 7, 8));
        assert_eq!((value(&bdd, &q), value(&bdd, &r)), (14, 2));
        let (q, r) = bdd.bv_udivrem(&c(&bdd, 9, 8), &c(&bdd, 0, 8));
        assert_eq!((value(&bdd, &q), value(&bdd, &r)), (255, 9));
    }

    #[test]
    fn test_sdivrem_constants() {
        let bdd = Bdd::default();
        let (q, r) = bdd.bv_sdivrem(&s(&bdd, -7, 8), &s(&bdd, 2, 8));
        assert_eq!(value(&bdd, &q) as u8 as i8, -3);
        assert_eq!(value(&bdd, &r) as u8 as i8, -1);
        let (q, r) = bdd.bv_sdivrem(&s(&bdd, 7, 8), &s(&bdd, -2, 8));
        assert_eq!(value(&bdd, &q) as u8 as i8, -3);
        assert_eq!(value(&bdd, &r) as u8 as i8, 1);
    }

    #[test]
    fn test_shifts() {
        let bdd = Bdd::default();
        let a = c(&bdd, 0b1001_0110, 8);
        assert_eq!(value(&bdd, &bdd.bv_shl(&a, &c(&bdd, 3, 8))), 0b1011_0000);
        assert_eq!(value(&bdd, &bdd.bv_lshr(&a, &c(&bdd, 3, 8))), 0b0001_0010);
        assert_eq!(value(&bdd, &bdd.bv_shl(&a, &c(&bdd, 8, 8))), 0);
        assert_eq!(value(&bdd, &bdd.bv_lshr(&a, &c(&bdd, 200, 8))), 0);
    }

    #[test]
    fn test_comparisons() {
        let bdd = Bdd::default();
        assert!(bdd.is_one(bdd.bv_ult(&c(&bdd, 3, 8), &c(&bdd, 200, 8))));
        assert!(bdd.is_zero(bdd.bv_slt(&s(&bdd, 3, 8), &s(&bdd, -56, 8))));
        assert!(bdd.is_one(bdd.bv_sle(&s(&bdd, -56, 8), &s(&bdd, -56, 8))));
        assert!(bdd.is_one(bdd.bv_eq(&c(&bdd, 9, 4), &c(&bdd, 9, 4))));
    }

    #[test]
    fn test_symbolic_eq_has_single_solution() {
        let bdd = Bdd::default();
        let x = bdd.bv_variable(1, 4, false);
        let f = bdd.bv_eq(&x, &c(&bdd, 0b0110, 4));
        let witness = bdd.one_sat(f).unwrap();
        assert_eq!(witness, vec![-1, 2, 3, -4]);
        assert_eq!(bdd.sat_count(f, 4), num_bigint::BigUint::from(1u32));
    }

    #[test]
    fn test_select() {
        let bdd = Bdd::default();
        let a = c(&bdd, 0b0100, 4);
        assert!(bdd.is_one(bdd.bv_select(&a, &c(&bdd, 2, 3))));
        assert!(bdd.is_zero(bdd.bv_select(&a, &c(&bdd, 1, 3))));
        assert!(bdd.is_zero(bdd.bv_select(&a, &c(&bdd, 6, 3))));
    }

    #[test]
    fn test_extract() {
        let bdd = Bdd::default();
        let x = bdd.bv_variable(1, 8, false);
        assert_eq!(bdd.bv_extract(&x, 7, 0), x);
        let bit = bdd.bv_extract(&x, 2, 2);
        assert_eq!(bit.width(), 1);
        assert_eq!(bit.bit(0), bdd.mk_var(3));
    }
}
