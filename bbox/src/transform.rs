use super::{CxCyWH, Rect, XYXY};
use crate::common::*;

/// Axis-aligned affine map `x' = x * sx + tx`, `y' = y * sy + ty`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sx: T,
    pub sy: T,
    pub tx: T,
    pub ty: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The map that sends `src` onto `tgt`.
    pub fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sx = tgt.w() / src.w();
        let sy = tgt.h() / src.h();
        let tx = tgt.x_min() - src.x_min() * sx;
        let ty = tgt.y_min() - src.y_min() * sy;

        Self { sx, sy, tx, ty }
    }
}

impl<T> Transform<T>
where
    T: Copy + Num + Neg<Output = T>,
{
    pub fn inverse(&self) -> Self {
        let sx = T::one() / self.sx;
        let sy = T::one() / self.sy;
        let tx = -self.tx / self.sx;
        let ty = -self.ty / self.sy;

        Self { sx, sy, tx, ty }
    }
}

impl<T> Mul<&XYXY<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = XYXY<T>;

    fn mul(self, rhs: &XYXY<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> Mul<&CxCyWH<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = CxCyWH<T>;

    fn mul(self, rhs: &CxCyWH<T>) -> Self::Output {
        rhs.transform(self)
    }
}

impl<T> Mul<&Transform<T>> for &Transform<T>
where
    T: Copy + Num,
{
    type Output = Transform<T>;

    fn mul(self, rhs: &Transform<T>) -> Self::Output {
        Transform {
            sx: self.sx * rhs.sx,
            sy: self.sy * rhs.sy,
            tx: rhs.tx * self.sx + self.tx,
            ty: rhs.ty * self.sy + self.ty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RectNum;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rect_transform_inverse() {
        let orig = Transform {
            sx: 2.0,
            sy: 2.0,
            tx: 1.0,
            ty: 1.0,
        };
        assert_eq!(orig.inverse().inverse(), orig);
    }

    #[test]
    fn rect_transform_from_rects() {
        let src = XYXY::from_xyxy([20.0, 10.0, 60.0, 90.0]);
        let tgt = XYXY::from_xyxy([0.0, 0.0, 1.0, 1.0]);
        let transform = Transform::from_rects(&src, &tgt);

        assert_abs_diff_eq!(transform.sx, 0.025);
        assert_abs_diff_eq!(transform.sy, 0.0125);
        assert_abs_diff_eq!(transform.tx, -0.5);
        assert_abs_diff_eq!(transform.ty, -0.125);

        let [x_min, y_min, x_max, y_max] = (&transform * &src).xyxy();
        assert_abs_diff_eq!(x_min, 0.0);
        assert_abs_diff_eq!(y_min, 0.0);
        assert_abs_diff_eq!(x_max, 1.0);
        assert_abs_diff_eq!(y_max, 1.0);
    }

    #[test]
    fn rect_transform_compose_with_inverse() {
        let transform = Transform {
            sx: 0.25,
            sy: 4.0,
            tx: -3.0,
            ty: 7.5,
        };
        let identity = &transform * &transform.inverse();
        assert_abs_diff_eq!(identity.sx, 1.0);
        assert_abs_diff_eq!(identity.sy, 1.0);
        assert_abs_diff_eq!(identity.tx, 0.0);
        assert_abs_diff_eq!(identity.ty, 0.0);
    }
}
