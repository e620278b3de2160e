//! 启动组合层测试
