//! Prime bucket counts.

/// Trial division by odd divisors up to √n.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest prime `>= n`, or `None` if it does not fit in `usize`.
pub fn next_prime(n: usize) -> Option<usize> {
    let mut candidate = n.max(2);
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(1)?;
    }
}
