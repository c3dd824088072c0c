//! Seeded 2D Perlin noise.
//!
//! The permutation table is shuffled with an xorshift PRNG so a given seed
//! produces the same field on every platform. Output is normalised into
//! [-1, 1].

/// 8 gradient directions
const GRADIENTS: [(f32, f32); 8] = [
    (1.0, 0.0), (0.707, 0.707), (0.0, 1.0), (-0.707, 0.707),
    (-1.0, 0.0), (-0.707, -0.707), (0.0, -1.0), (0.707, -0.707),
];

/// Raw 2D Perlin output with unit gradients peaks at about 1/sqrt(2).
const OUTPUT_SCALE: f32 = std::f32::consts::SQRT_2;

fn xorshift(mut x: u32) -> u32 {
    x ^= x << 13;
    x ^= x >> 19;
    x ^= x << 12;
    x
}

/// A coherent noise channel with its own sampling frequency
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    /// Permutation doubled to 512 entries so lookups never wrap
    perm: [u8; 512],
    frequency: f32,
}

impl PerlinNoise {
    pub fn new(seed: u32, frequency: f32) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        // Fisher-Yates; xorshift gets stuck on 0
        let mut rng = match seed.wrapping_add(341) {
            0 => 341,
            s => s,
        };
        for i in (1..256).rev() {
            rng = xorshift(rng);
            let j = (rng as usize) % (i + 1);
            table.swap(i, j);
        }

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&table);
        perm[256..].copy_from_slice(&table);

        Self { perm, frequency }
    }

    /// Sample at world coordinates; the channel's frequency is applied here.
    pub fn get(&self, x: f32, y: f32) -> f32 {
        (self.noise(x * self.frequency, y * self.frequency) * OUTPUT_SCALE).clamp(-1.0, 1.0)
    }

    #[inline(always)]
    fn hash(&self, xi: i32, yi: i32) -> usize {
        let x_idx = (xi & 0xFF) as usize;
        let y_idx = (yi & 0xFF) as usize;
        (self.perm[self.perm[x_idx] as usize + y_idx] & 7) as usize
    }

    #[inline(always)]
    fn noise(&self, x: f32, y: f32) -> f32 {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;
        let xf = x - xi as f32;
        let yf = y - yi as f32;

        // Fade: 6t^5 - 15t^4 + 10t^3
        let u = xf * xf * xf * (xf * (xf * 6.0 - 15.0) + 10.0);
        let v = yf * yf * yf * (yf * (yf * 6.0 - 15.0) + 10.0);

        let grad = |hx: i32, hy: i32, dx: f32, dy: f32| -> f32 {
            let (gx, gy) = GRADIENTS[self.hash(hx, hy)];
            gx * dx + gy * dy
        };

        let n00 = grad(xi, yi, xf, yf);
        let n10 = grad(xi + 1, yi, xf - 1.0, yf);
        let n01 = grad(xi, yi + 1, xf, yf - 1.0);
        let n11 = grad(xi + 1, yi + 1, xf - 1.0, yf - 1.0);

        let nx0 = n00 + u * (n10 - n00);
        let nx1 = n01 + u * (n11 - n01);
        nx0 + v * (nx1 - nx0)
    }
}
