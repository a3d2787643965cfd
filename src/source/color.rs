use super::types::ImageSource;
use crate::frame::{filled, Frame, Shape};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;

/// Background of one constant color
pub struct FixedColorSource {
    frame: Frame,
}

impl FixedColorSource {
    pub fn new(shape: Shape, color: [u8; 3]) -> Self {
        Self {
            frame: filled(shape, color.map(f32::from)),
        }
    }
}

impl ImageSource for FixedColorSource {
    fn get_image(&mut self) -> Result<Frame> {
        Ok(self.frame.clone())
    }

    fn shape(&self) -> Shape {
        Shape::of_frame(&self.frame)
    }
}

/// Background of one flat color, redrawn uniformly at every reset
pub struct RandomColorSource<R: Rng = StdRng> {
    shape: Shape,
    rng: R,
    color: [u8; 3],
}

impl<R: Rng> RandomColorSource<R> {
    pub fn new(shape: Shape, mut rng: R) -> Self {
        let color = rng.gen::<[u8; 3]>();
        tracing::debug!("Initial background color {:?}", color);
        Self { shape, rng, color }
    }

    /// Color used until the next reset
    pub fn color(&self) -> [u8; 3] {
        self.color
    }
}

impl<R: Rng> ImageSource for RandomColorSource<R> {
    fn get_image(&mut self) -> Result<Frame> {
        Ok(filled(self.shape, self.color.map(f32::from)))
    }

    fn reset(&mut self) -> Result<()> {
        self.color = self.rng.gen::<[u8; 3]>();
        tracing::debug!("Background color redrawn as {:?}", self.color);
        Ok(())
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn fixed_color_is_stable_across_calls() {
        let mut source = FixedColorSource::new(Shape::new(4, 5), [200, 100, 50]);

        let first = source.get_image().unwrap();
        source.reset().unwrap();
        let second = source.get_image().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.dim(), (4, 5, 3));
        for pixel in first.lanes(ndarray::Axis(2)) {
            assert_eq!(pixel.to_vec(), vec![200.0, 100.0, 50.0]);
        }
    }

    #[test]
    fn random_color_holds_until_reset() {
        let mut source = RandomColorSource::new(Shape::new(3, 3), StdRng::seed_from_u64(7));

        let first = source.get_image().unwrap();
        let second = source.get_image().unwrap();
        assert_eq!(first, second);

        let color = source.color().map(f32::from);
        assert!(first.iter().enumerate().all(|(i, &v)| v == color[i % 3]));
    }

    #[test]
    fn random_color_changes_across_resets() {
        let mut source = RandomColorSource::new(Shape::new(1, 1), StdRng::seed_from_u64(11));

        let mut colors = vec![source.color()];
        for _ in 0..16 {
            source.reset().unwrap();
            colors.push(source.color());
        }
        colors.dedup();

        assert!(colors.len() > 1);
    }

    #[test]
    fn random_color_is_reproducible_with_a_seed() {
        let mut a = RandomColorSource::new(Shape::new(2, 2), StdRng::seed_from_u64(3));
        let mut b = RandomColorSource::new(Shape::new(2, 2), StdRng::seed_from_u64(3));

        for _ in 0..4 {
            assert_eq!(a.get_image().unwrap(), b.get_image().unwrap());
            a.reset().unwrap();
            b.reset().unwrap();
        }
    }
}
