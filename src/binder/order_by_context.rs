use crate::statement::{GroupBySegment, NullsOrder, OrderByItemSegment, OrderBySegment, OrderDirection};

/// ORDER BY / GROUP BY item bound to the output column it sorts on.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub segment: OrderByItemSegment,
    /// 1-based projection index, 0 until bound.
    pub index: usize,
}

impl OrderByItem {
    pub fn new(segment: OrderByItemSegment) -> Self {
        Self { segment, index: 0 }
    }

    pub fn direction(&self) -> OrderDirection {
        self.segment.direction()
    }

    pub fn nulls(&self) -> NullsOrder {
        self.segment.nulls()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupByContext {
    pub items: Vec<OrderByItem>,
    /// Offset of the last character of the GROUP BY clause.
    pub stop: Option<usize>,
}

impl GroupByContext {
    pub fn new(segment: Option<&GroupBySegment>) -> Self {
        match segment {
            Some(segment) => Self {
                items: segment.items.iter().cloned().map(OrderByItem::new).collect(),
                stop: Some(segment.stop),
            },
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderByContext {
    pub items: Vec<OrderByItem>,
    /// Copied from GROUP BY because the statement had no ORDER BY.
    pub generated: bool,
}

impl OrderByContext {
    pub fn new(segment: Option<&OrderBySegment>, group_by: &GroupByContext) -> Self {
        match segment {
            Some(segment) if !segment.items.is_empty() => Self {
                items: segment.items.iter().cloned().map(OrderByItem::new).collect(),
                generated: false,
            },
            _ if !group_by.is_empty() => Self { items: group_by.items.clone(), generated: true },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::ColumnSegment;

    #[test]
    fn order_by_falls_back_to_group_by() {
        let group = GroupBySegment {
            start: 30,
            stop: 46,
            items: vec![OrderByItemSegment::column(ColumnSegment::new(39, 46, "user_id"), OrderDirection::Asc)],
        };
        let group_by = GroupByContext::new(Some(&group));
        let order_by = OrderByContext::new(None, &group_by);

        assert!(order_by.generated);
        assert_eq!(order_by.items, group_by.items);
        assert_eq!(group_by.stop, Some(46));
    }

    #[test]
    fn explicit_order_by_is_kept() {
        let order = OrderBySegment {
            start: 0,
            stop: 20,
            items: vec![OrderByItemSegment::column(ColumnSegment::new(9, 15, "user_id"), OrderDirection::Desc)],
        };
        let order_by = OrderByContext::new(Some(&order), &GroupByContext::default());
        assert!(!order_by.generated);
        assert_eq!(order_by.items[0].direction(), OrderDirection::Desc);
        assert_eq!(order_by.items[0].nulls(), NullsOrder::Last);
    }
}
