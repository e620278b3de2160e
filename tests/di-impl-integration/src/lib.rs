//! 跨 crate 的容器场景测试，测试代码位于 `tests/` 目录。
