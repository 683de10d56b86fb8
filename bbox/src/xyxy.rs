use super::{CxCyWH, Rect};
use crate::{common::*, Transform};

/// Bounding box in corner format `(x_min, y_min, x_max, y_max)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct XYXY<T> {
    pub(crate) x_min: T,
    pub(crate) y_min: T,
    pub(crate) x_max: T,
    pub(crate) y_max: T,
}

impl<T> XYXY<T> {
    pub fn try_cast<V>(self) -> Option<XYXY<V>>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        Some(XYXY {
            x_min: V::from(self.x_min)?,
            y_min: V::from(self.y_min)?,
            x_max: V::from(self.x_max)?,
            y_max: V::from(self.y_max)?,
        })
    }

    pub fn cast<V>(self) -> XYXY<V>
    where
        T: ToPrimitive,
        V: NumCast,
    {
        self.try_cast().unwrap()
    }
}

impl<T> XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Compute the axis-aligned bounding rectangle of a polygon.
    ///
    /// The vertices are given as a flat `[x1, y1, x2, y2, ...]` list. The
    /// polygon shape is discarded.
    pub fn try_from_polygon(vertices: &[T]) -> Result<Self> {
        ensure!(
            vertices.len() % 2 == 0,
            "expect an even number of vertex coordinates, but get {}",
            vertices.len()
        );

        let mut points = vertices.chunks_exact(2).map(|xy| (xy[0], xy[1]));
        let (x, y) = match points.next() {
            Some(point) => point,
            None => bail!("the polygon has no vertices"),
        };
        let init = Self {
            x_min: x,
            y_min: y,
            x_max: x,
            y_max: y,
        };

        let rect = points.fold(init, |rect, (x, y)| Self {
            x_min: if x < rect.x_min { x } else { rect.x_min },
            y_min: if y < rect.y_min { y } else { rect.y_min },
            x_max: if x > rect.x_max { x } else { rect.x_max },
            y_max: if y > rect.y_max { y } else { rect.y_max },
        });

        Ok(rect)
    }

    pub fn transform(&self, transform: &Transform<T>) -> Self {
        XYXY {
            x_min: self.x_min * transform.sx + transform.tx,
            y_min: self.y_min * transform.sy + transform.ty,
            x_max: self.x_max * transform.sx + transform.tx,
            y_max: self.y_max * transform.sy + transform.ty,
        }
    }
}

impl<T> Rect for XYXY<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn x_min(&self) -> Self::Type {
        self.x_min
    }

    fn y_min(&self) -> Self::Type {
        self.y_min
    }

    fn x_max(&self) -> Self::Type {
        self.x_max
    }

    fn y_max(&self) -> Self::Type {
        self.y_max
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        (self.x_min + self.x_max) / two
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        (self.y_min + self.y_max) / two
    }

    fn w(&self) -> Self::Type {
        self.x_max - self.x_min
    }

    fn h(&self) -> Self::Type {
        self.y_max - self.y_min
    }

    fn try_from_xyxy(xyxy: [Self::Type; 4]) -> Result<Self> {
        let [x_min, y_min, x_max, y_max] = xyxy;
        ensure!(
            x_min <= x_max && y_min <= y_max,
            "x_min <= x_max and y_min <= y_max must hold"
        );

        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self> {
        let [cx, cy, w, h] = cxcywh;
        let zero = T::zero();
        ensure!(w >= zero && h >= zero, "w and h must be non-negative");

        let two = T::one() + T::one();
        Ok(Self {
            x_min: cx - w / two,
            y_min: cy - h / two,
            x_max: cx + w / two,
            y_max: cy + h / two,
        })
    }
}

impl<T> From<CxCyWH<T>> for XYXY<T>
where
    T: Copy + Num,
{
    fn from(from: CxCyWH<T>) -> Self {
        Self::from(&from)
    }
}

impl<T> From<&CxCyWH<T>> for XYXY<T>
where
    T: Copy + Num,
{
    fn from(from: &CxCyWH<T>) -> Self {
        let two = T::one() + T::one();
        let CxCyWH { cx, cy, w, h } = *from;
        Self {
            x_min: cx - w / two,
            y_min: cy - h / two,
            x_max: cx + w / two,
            y_max: cy + h / two,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;

    #[test]
    fn polygon_bounding_rect() {
        let rect =
            XYXY::try_from_polygon(&[12.0, 40.0, 30.5, 8.0, 52.0, 20.0, 25.0, 61.25]).unwrap();
        assert_eq!(rect.xyxy(), [12.0, 8.0, 52.0, 61.25]);
    }

    #[test]
    fn polygon_single_vertex() {
        let rect = XYXY::try_from_polygon(&[3.0, 4.0]).unwrap();
        assert_eq!(rect.xyxy(), [3.0, 4.0, 3.0, 4.0]);
        assert_eq!(rect.area(), 0.0);
    }

    #[test]
    fn polygon_invalid_vertex_count() {
        assert!(XYXY::<f64>::try_from_polygon(&[]).is_err());
        assert!(XYXY::try_from_polygon(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn xyxy_rejects_inverted_corners() {
        assert!(XYXY::try_from_xyxy([5.0, 0.0, 4.0, 1.0]).is_err());
        assert!(XYXY::try_from_xyxy([0.0, 5.0, 1.0, 4.0]).is_err());
    }

    #[test]
    fn xyxy_center_form() {
        let rect = XYXY::from_xyxy([10.0, 20.0, 50.0, 30.0]);
        assert_eq!(rect.cxcywh(), [30.0, 25.0, 40.0, 10.0]);
        assert_eq!(XYXY::from(rect.to_cxcywh()), rect);
    }
}
