mod prop_condition;
