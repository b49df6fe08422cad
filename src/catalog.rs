//! 元数据目录：模型、列和关系描述
//!
//! 编译器只通过 [`Catalog`] 读取元数据，不做修改。
//! [`MemoryCatalog`] 是一个内存实现，可以从 JSON 文件加载。

use crate::error::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// 列的数据类型，决定比较运算的细节（数值转换、日期、空值语义）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataType {
    #[default]
    SingleLineText,
    LongText,
    Email,
    #[serde(rename = "URL")]
    Url,
    PhoneNumber,
    Number,
    Decimal,
    Currency,
    Percent,
    Rating,
    Duration,
    Year,
    Checkbox,
    Date,
    DateTime,
    CreatedTime,
    LastModifiedTime,
    Time,
    SingleSelect,
    MultiSelect,
    #[serde(rename = "JSON")]
    Json,
    Attachment,
    Links,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Number
                | DataType::Decimal
                | DataType::Currency
                | DataType::Percent
                | DataType::Rating
                | DataType::Duration
                | DataType::Year
        )
    }

    /// 可以使用日期子运算符的类型
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            DataType::Date | DataType::DateTime | DataType::CreatedTime | DataType::LastModifiedTime
        )
    }

    /// 带时间部分的日期类型，按天比较时需要截断
    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            DataType::DateTime | DataType::CreatedTime | DataType::LastModifiedTime
        )
    }

    /// `blank` 同时匹配空字符串的类型
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DataType::SingleLineText
                | DataType::LongText
                | DataType::Email
                | DataType::Url
                | DataType::PhoneNumber
                | DataType::SingleSelect
                | DataType::MultiSelect
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Url => f.write_str("URL"),
            DataType::Json => f.write_str("JSON"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupFunction {
    Count,
    CountDistinct,
    Sum,
    SumDistinct,
    Avg,
    AvgDistinct,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupOptions {
    pub relation_column_id: String,
    pub rollup_column_id: String,
    pub function: RollupFunction,
}

/// 公式列：目录提供已经编译好的 SQL 表达式
///
/// 表达式中的 `{table}` 会被替换为所属表或其别名。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaOptions {
    pub expression: String,
    #[serde(default)]
    pub result_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    pub relation_column_id: String,
    pub lookup_column_id: String,
}

/// 列的种类，每种对应一个字段处理器
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Plain,
    Rollup(RollupOptions),
    Formula(FormulaOptions),
    Lookup(LookupOptions),
    Relation,
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Plain => "plain",
            ColumnKind::Rollup(_) => "rollup",
            ColumnKind::Formula(_) => "formula",
            ColumnKind::Lookup(_) => "lookup",
            ColumnKind::Relation => "relation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// 物理列名；虚拟列（关系、查找、汇总、公式）为空
    #[serde(default)]
    pub column_name: String,
    pub model_id: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub kind: ColumnKind,
    /// 日期列的显示格式，`YYYY-MM` 表示按月比较
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl Column {
    pub fn plain(
        id: impl Into<String>,
        model_id: impl Into<String>,
        column_name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        let column_name = column_name.into();
        Self {
            id: id.into(),
            title: column_name.clone(),
            column_name,
            model_id: model_id.into(),
            data_type,
            kind: ColumnKind::Plain,
            date_format: None,
        }
    }

    /// 显示用名称：优先标题，其次 id
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    /// 一个父记录对应多个子记录
    #[serde(rename = "direct-many")]
    HasMany,
    /// 子记录引用一个父记录
    #[serde(rename = "direct-one")]
    BelongsTo,
    #[serde(rename = "many-to-many")]
    ManyToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationKind::HasMany => "direct-many",
            RelationKind::BelongsTo => "direct-one",
            RelationKind::ManyToMany => "many-to-many",
        })
    }
}

/// 关系的一端：模型、物理表和参与连接的列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub model_id: String,
    pub table: String,
    pub column: String,
}

/// 多对多关系的中间表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub table: String,
    /// 引用 `local.column` 的列
    pub local_column: String,
    /// 引用 `foreign.column` 的列
    pub foreign_column: String,
}

/// 关系描述
///
/// `local` 总是关系列所在的一端，`foreign` 是另一端：
///
/// | kind          | local.column | foreign.column |
/// |---------------|--------------|----------------|
/// | direct-many   | 父表主键     | 子表外键       |
/// | direct-one    | 子表外键     | 父表主键       |
/// | many-to-many  | 本表主键     | 对端主键       |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    pub local: Endpoint,
    pub foreign: Endpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub junction: Option<Junction>,
    /// 对端模型的显示列，直接过滤关系列时比较的就是它
    pub display_column_id: String,
}

impl RelationDescriptor {
    pub fn is_self_reference(&self) -> bool {
        self.local.table == self.foreign.table
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub table_name: String,
}

/// 只读的元数据访问接口
///
/// 每个方法都可能是一次 I/O。
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_column(&self, id: &str) -> Result<Option<Column>, CatalogError>;

    async fn get_relation_descriptor(
        &self,
        column_id: &str,
    ) -> Result<RelationDescriptor, CatalogError>;

    async fn get_model_columns(&self, model_id: &str) -> Result<Vec<Column>, CatalogError>;
}

/// 内存中的目录快照
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub relations: HashMap<String, RelationDescriptor>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从JSON文件加载目录
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_relation(mut self, column_id: impl Into<String>, relation: RelationDescriptor) -> Self {
        self.relations.insert(column_id.into(), relation);
        self
    }

    pub fn model(&self, model_id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// 按 id 或标题查找模型的物理表名
    pub fn table_name(&self, model: &str) -> Result<&str, CatalogError> {
        self.models
            .iter()
            .find(|m| m.id == model || m.title == model)
            .map(|m| m.table_name.as_str())
            .ok_or_else(|| CatalogError::ModelNotFound(model.to_string()))
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_column(&self, id: &str) -> Result<Option<Column>, CatalogError> {
        Ok(self.columns.iter().find(|c| c.id == id).cloned())
    }

    async fn get_relation_descriptor(
        &self,
        column_id: &str,
    ) -> Result<RelationDescriptor, CatalogError> {
        self.relations
            .get(column_id)
            .cloned()
            .ok_or_else(|| CatalogError::RelationNotFound(column_id.to_string()))
    }

    async fn get_model_columns(&self, model_id: &str) -> Result<Vec<Column>, CatalogError> {
        let columns: Vec<Column> = self
            .columns
            .iter()
            .filter(|c| c.model_id == model_id)
            .cloned()
            .collect();
        if columns.is_empty() && self.model(model_id).is_none() {
            return Err(CatalogError::ModelNotFound(model_id.to_string()));
        }
        Ok(columns)
    }
}

/// 测试用的示例目录：客户、订单、产品、供应商
#[cfg(test)]
pub(crate) fn sample_catalog() -> MemoryCatalog {
    MemoryCatalog::from_json_str(include_str!("../fixtures/catalog.json"))
        .expect("sample catalog should parse")
}
