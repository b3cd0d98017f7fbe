//! 五次 Hermite 插值
//!
//! 给定两端的位置、速度、加速度（共 6 个约束），求唯一的五次多项式
//!
//! ```text
//! y(x) = a0 + a1·s + a2·s² + a3·s³ + a4·s⁴ + a5·s⁵,   s = x - x0
//! ```
//!
//! 系数为闭式解，无迭代。`y` / `dy` / `ddy` 不对 x 做截断，
//! 区间外的外推由调用方负责。

/// 五次 Hermite 插值器（每个关节一个）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuinticHermiteInterpolator {
    x0: f64,
    coefficients: [f64; 6],
}

impl QuinticHermiteInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算系数
    ///
    /// # 参数
    /// - `x0`, `x1`: 起点与终点自变量（通常为时间）
    /// - `y0`, `y1`: 两端位置
    /// - `dy0`, `dy1`: 两端一阶导数
    /// - `ddy0`, `ddy1`: 两端二阶导数
    ///
    /// `x1 == x0` 时退化为常数 `y1`。
    #[allow(clippy::too_many_arguments)]
    pub fn compute_coefficients(
        &mut self,
        x0: f64,
        x1: f64,
        y0: f64,
        y1: f64,
        dy0: f64,
        dy1: f64,
        ddy0: f64,
        ddy1: f64,
    ) {
        self.x0 = x0;
        let t = x1 - x0;
        if t == 0.0 {
            self.coefficients = [y1, 0.0, 0.0, 0.0, 0.0, 0.0];
            return;
        }

        let h = y1 - y0;
        let t2 = t * t;
        let t3 = t2 * t;
        let t4 = t3 * t;
        let t5 = t4 * t;

        self.coefficients = [
            y0,
            dy0,
            ddy0 / 2.0,
            (20.0 * h - (8.0 * dy1 + 12.0 * dy0) * t - (3.0 * ddy0 - ddy1) * t2) / (2.0 * t3),
            (-30.0 * h + (14.0 * dy1 + 16.0 * dy0) * t + (3.0 * ddy0 - 2.0 * ddy1) * t2)
                / (2.0 * t4),
            (12.0 * h - 6.0 * (dy1 + dy0) * t + (ddy1 - ddy0) * t2) / (2.0 * t5),
        ];
    }

    /// 位置
    pub fn y(&self, x: f64) -> f64 {
        let s = x - self.x0;
        let [a0, a1, a2, a3, a4, a5] = self.coefficients;
        a0 + s * (a1 + s * (a2 + s * (a3 + s * (a4 + s * a5))))
    }

    /// 一阶导数
    pub fn dy(&self, x: f64) -> f64 {
        let s = x - self.x0;
        let [_, a1, a2, a3, a4, a5] = self.coefficients;
        a1 + s * (2.0 * a2 + s * (3.0 * a3 + s * (4.0 * a4 + s * 5.0 * a5)))
    }

    /// 二阶导数
    pub fn ddy(&self, x: f64) -> f64 {
        let s = x - self.x0;
        let [_, _, a2, a3, a4, a5] = self.coefficients;
        2.0 * a2 + s * (6.0 * a3 + s * (12.0 * a4 + s * 20.0 * a5))
    }

    /// 多项式系数 `[a0, ..., a5]`（自变量为 `x - x0`）
    pub fn coefficients(&self) -> [f64; 6] {
        self.coefficients
    }
}
